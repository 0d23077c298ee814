mod config;
mod filters;
mod models;
mod notify;
mod runner;
mod scrapers;
mod snapshot;
mod storage;

use config::Config;
use notify::DiscordNotifier;
use runner::SearchRunner;
use scrapers::{types::load_searches, SubitoScraper};
use storage::FreshnessStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    info!("🛒 Subito Watch");
    info!("==============");

    let searches = load_searches(&config.searches_file).await?;
    info!("Loaded {} searches from {}", searches.len(), config.searches_file.display());

    let scraper = SubitoScraper::with_options(&config.base_url, config.timeout())?;
    let store = FreshnessStore::new(&config.state_file);

    let discord = match (&config.webhook_url, config.use_discord) {
        (Some(url), true) => Some(DiscordNotifier::new(url.as_str())?),
        _ => None,
    };

    let mut runner = SearchRunner::new(&scraper, &store);
    if let Some(discord) = &discord {
        runner = runner.with_notifier(discord);
    }
    if config.save_as_html {
        runner = runner.with_snapshots(&config.html_dir);
    }

    let results = runner.run(&searches).await?;

    let total: usize = results.iter().map(|r| r.listings.len()).sum();
    info!("\n✅ Found {} new listings across {} searches\n", total, results.len());

    for result in &results {
        for listing in &result.listings {
            println!(
                "[{}] {} ({})",
                result.search_key,
                listing.title.as_deref().unwrap_or("?"),
                listing.price_label()
            );
            if let Some(link) = &listing.link {
                println!("   URL: {}", link);
            }
        }
    }

    Ok(())
}
