use crate::filters::PriceRange;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Location token used in search keys when no region is given
pub const NATIONWIDE: &str = "italia";

/// Default upper bound of the price filter
pub const DEFAULT_MAX_PRICE: f64 = 1_000_000.0;

/// A saved search, as read from the search configuration document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchDefinition {
    /// Free-text query
    #[serde(rename = "string")]
    pub query: String,
    /// Region, e.g. "emilia romagna"
    #[serde(default)]
    pub region: Option<String>,
    /// Province inside the region; requires `region`
    #[serde(default)]
    pub province: Option<String>,
    /// City inside the province; requires `province`
    #[serde(default)]
    pub city: Option<String>,
    /// Number of result pages to walk
    #[serde(rename = "pages_number", default = "default_pages")]
    pub pages_to_scan: u32,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    /// Pause between two result pages, in seconds
    #[serde(rename = "sleep_time", default = "default_delay")]
    pub request_delay_seconds: f64,
}

fn default_pages() -> u32 {
    5
}

fn default_delay() -> f64 {
    5.0
}

impl SearchDefinition {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            region: None,
            province: None,
            city: None,
            pages_to_scan: default_pages(),
            min_price: None,
            max_price: None,
            request_delay_seconds: default_delay(),
        }
    }

    /// Stable identity of the search, used to index freshness state.
    ///
    /// Location parts lose their inner spaces; a missing region becomes
    /// "italia", missing province and city become empty.
    pub fn search_key(&self) -> String {
        let squash = |part: &Option<String>| part.as_deref().map(|s| s.replace(' ', ""));

        let region = squash(&self.region).unwrap_or_else(|| NATIONWIDE.to_string());
        let province = squash(&self.province).unwrap_or_default();
        let city = squash(&self.city).unwrap_or_default();

        format!("{} {} {} {}", self.query, region, province, city)
            .trim()
            .to_string()
    }

    pub fn price_range(&self) -> PriceRange {
        PriceRange::new(self.min_price, self.max_price)
    }

    /// Check the location hierarchy: city implies province implies region.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            bail!("search has an empty query string");
        }
        if self.city.is_some() && self.province.is_none() {
            bail!("search '{}' sets a city without a province", self.query);
        }
        if self.province.is_some() && self.region.is_none() {
            bail!("search '{}' sets a province without a region", self.query);
        }
        if !self.request_delay_seconds.is_finite() || self.request_delay_seconds < 0.0 {
            bail!("search '{}' has an invalid sleep_time", self.query);
        }
        Ok(())
    }
}

/// Parse and validate a JSON array of search definitions.
pub fn parse_searches(json: &str) -> Result<Vec<SearchDefinition>> {
    let searches: Vec<SearchDefinition> =
        serde_json::from_str(json).context("Invalid search configuration document")?;

    for search in &searches {
        search.validate()?;
    }

    Ok(searches)
}

/// Load the search configuration document from disk.
pub async fn load_searches(path: &Path) -> Result<Vec<SearchDefinition>> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read searches file {}", path.display()))?;

    parse_searches(&json).with_context(|| format!("Failed to load {}", path.display()))
}
