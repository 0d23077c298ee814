use crate::scrapers::subito::DEFAULT_BASE_URL;
use anyhow::{bail, Result};
use clap::builder::BoolishValueParser;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Watch Subito.it saved searches and report new listings
#[derive(Debug, Clone, Parser)]
#[command(name = "subito-watch", version, about)]
pub struct Config {
    /// JSON file with the list of searches
    #[arg(long, env = "SEARCHES_FILE", default_value = "./files/json/search.json")]
    pub searches_file: PathBuf,

    /// Send every new listing to the Discord webhook
    #[arg(long, env = "USE_DISCORD", value_parser = BoolishValueParser::new())]
    pub use_discord: bool,

    /// Write an HTML page with the new listings of each search
    #[arg(long, env = "SAVE_AS_HTML", value_parser = BoolishValueParser::new())]
    pub save_as_html: bool,

    /// Discord webhook URL, required with --use-discord
    #[arg(long, env = "DISCORD_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// CSV file holding the last seen date of each search
    #[arg(long, env = "STATE_FILE", default_value = "files/csv/last_searches_dates.csv")]
    pub state_file: PathBuf,

    /// Directory for HTML snapshots
    #[arg(long, env = "HTML_DIR", default_value = "files/html")]
    pub html_dir: PathBuf,

    /// Base URL of the listing site
    #[arg(long, env = "SUBITO_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Connect and read timeout for result pages, in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Config {
    /// Parse the command line, reading a `.env` file first if there is one
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.use_discord && self.webhook_url.as_deref().map_or(true, str::is_empty) {
            bail!("--use-discord needs a webhook URL (DISCORD_WEBHOOK_URL)");
        }
        if self.timeout_secs == 0 {
            bail!("HTTP timeout must be at least one second");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["subito-watch"]).unwrap();
        assert_eq!(config.searches_file, PathBuf::from("./files/json/search.json"));
        assert_eq!(config.state_file, PathBuf::from("files/csv/last_searches_dates.csv"));
        assert_eq!(config.html_dir, PathBuf::from("files/html"));
        assert_eq!(config.base_url, "https://www.subito.it");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_flags() {
        let config = Config::try_parse_from([
            "subito-watch",
            "--use-discord",
            "--save-as-html",
            "--webhook-url",
            "https://discord.com/api/webhooks/1/abc",
            "--searches-file",
            "my.json",
        ])
        .unwrap();
        assert!(config.use_discord);
        assert!(config.save_as_html);
        assert_eq!(config.searches_file, PathBuf::from("my.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toggles_accept_boolish_env_values() {
        let cases = [
            ("1", true),
            ("True", true),
            ("yes", true),
            ("on", true),
            ("0", false),
            ("False", false),
        ];
        for (value, expected) in cases {
            std::env::set_var("SAVE_AS_HTML", value);
            let config = Config::try_parse_from(["subito-watch"])
                .unwrap_or_else(|e| panic!("SAVE_AS_HTML={} rejected: {}", value, e));
            assert_eq!(config.save_as_html, expected, "SAVE_AS_HTML={}", value);
        }
        std::env::remove_var("SAVE_AS_HTML");

        for value in ["1", "True"] {
            std::env::set_var("USE_DISCORD", value);
            let config = Config::try_parse_from(["subito-watch"]).unwrap();
            assert!(config.use_discord, "USE_DISCORD={}", value);
        }
        std::env::remove_var("USE_DISCORD");
    }

    #[test]
    fn test_discord_requires_webhook() {
        let config = Config::try_parse_from(["subito-watch", "--use-discord"]).unwrap();
        assert!(config.validate().is_err());
    }
}
