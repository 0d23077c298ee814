use crate::scrapers::traits::PageSource;
use crate::scrapers::types::{SearchDefinition, NATIONWIDE};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.subito.it";

/// Subito.it result page client
pub struct SubitoScraper {
    client: Client,
    base_url: String,
}

impl SubitoScraper {
    /// Create a client against a custom base URL and transport timeout
    pub fn with_options(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the URL of one result page.
    ///
    /// Each location level narrows the path; absent trailing levels are left
    /// out, and without a region the search is nation-wide.
    pub fn build_search_url(&self, search: &SearchDefinition, page: u32) -> Result<Url> {
        let region = search.region.as_deref().map(slugify);
        let mut path = format!(
            "{}/annunci-{}/vendita/usato/",
            self.base_url,
            region.as_deref().unwrap_or(NATIONWIDE)
        );

        if region.is_some() {
            for level in [&search.province, &search.city] {
                match level.as_deref() {
                    Some(name) => {
                        path.push_str(&slugify(name));
                        path.push('/');
                    }
                    None => break,
                }
            }
        }

        let page = page.to_string();
        Url::parse_with_params(&path, &[("q", search.query.as_str()), ("o", page.as_str())])
            .with_context(|| format!("Invalid search URL {}", path))
    }
}

/// Lowercase a location name and join its words with dashes
fn slugify(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

#[async_trait]
impl PageSource for SubitoScraper {
    async fn fetch_page(&self, search: &SearchDefinition, page: u32) -> Result<String> {
        let url = self.build_search_url(search, page)?;

        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            warn!("Subito returned status: {}", response.status());
            anyhow::bail!("Failed to fetch {}: {}", url, response.status());
        }

        let html = response.text().await.context("Failed to read response body")?;

        debug!("Downloaded {} bytes of HTML", html.len());

        Ok(html)
    }

    fn source_name(&self) -> &'static str {
        "Subito"
    }
}
