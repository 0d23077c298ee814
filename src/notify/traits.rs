use crate::models::Listing;
use anyhow::Result;
use async_trait::async_trait;

/// Destination for newly found listings
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce one listing found by the search labelled `search_label`
    async fn notify(&self, listing: &Listing, search_label: &str) -> Result<()>;

    /// Get the name of the channel
    fn channel_name(&self) -> &'static str;
}
