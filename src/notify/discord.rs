use crate::models::Listing;
use crate::notify::traits::Notifier;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const USERNAME: &str = "SubitBOT";
const AVATAR_URL: &str = "https://i.imgur.com/4M34hi2.png";
const EMBED_COLOR: u32 = 15258703;

/// Posts each listing as an embed to a Discord webhook
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

/// Webhook body for one listing. Missing link and image are left out of the embed.
pub fn build_payload(listing: &Listing, search_label: &str) -> Value {
    let posted_at = listing
        .posted_at
        .map(|date| date.to_string())
        .unwrap_or_else(|| "Data non disponibile".to_string());

    let mut embed = json!({
        "title": listing.title.as_deref().unwrap_or("Annuncio senza titolo"),
        "color": EMBED_COLOR,
        "fields": [{
            "name": listing.price_label(),
            "value": posted_at,
        }],
    });
    if let Some(link) = &listing.link {
        embed["url"] = json!(link);
    }
    if let Some(image_url) = &listing.image_url {
        embed["image"] = json!({ "url": image_url });
    }

    json!({
        "username": USERNAME,
        "avatar_url": AVATAR_URL,
        "content": format!("Nuovo risultato per la ricerca: {}", search_label),
        "embeds": [embed],
    })
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, listing: &Listing, search_label: &str) -> Result<()> {
        let payload = build_payload(listing, search_label);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .context("Failed to reach Discord webhook")?;

        if !response.status().is_success() {
            anyhow::bail!("Discord webhook returned status: {}", response.status());
        }

        debug!("Sent {:?} to Discord", listing.title);
        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "Discord"
    }
}
