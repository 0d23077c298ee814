use crate::models::Listing;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Render accepted listings as a standalone HTML page
pub fn render(listings: &[Listing]) -> String {
    let mut html = String::from(r#"<head><meta charset="utf-8"></head><body>"#);
    for listing in listings {
        html.push('\n');
        html.push_str(&listing.raw_html);
    }
    html.push_str("\n</body>");
    html
}

/// File name for a search label: anything but letters, digits, spaces, `-` and `_`
/// becomes `_`, so the file always lands directly inside the snapshot directory.
pub fn file_name(label: &str) -> String {
    let stem: String = label
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' => c,
            _ => '_',
        })
        .collect();
    format!("{}.html", stem)
}

/// Write `<dir>/<label>.html` with the raw fragments of `listings`
pub async fn save_snapshot(dir: &Path, label: &str, listings: &[Listing]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(file_name(label));
    tokio::fs::write(&path, render(listings))
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("💾 Saved {} listings to {}", listings.len(), path.display());
    Ok(path)
}
