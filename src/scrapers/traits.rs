use crate::scrapers::types::SearchDefinition;
use anyhow::Result;
use async_trait::async_trait;

/// Source of search result pages
///
/// Implementations must return listings newest first, both within a page and
/// across consecutive pages. The scrape engine stops paging at the first
/// listing it has already seen, so a source that interleaves older results
/// will silently hide newer ones.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the raw HTML of result page `page` (1-based) for `search`
    async fn fetch_page(&self, search: &SearchDefinition, page: u32) -> Result<String>;

    /// Get the name of the listing site
    fn source_name(&self) -> &'static str;
}
