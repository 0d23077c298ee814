use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One classified ad extracted from a result page.
///
/// Every field is optional because extraction of each one may fail on its
/// own; a listing is never discarded for a missing field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub title: Option<String>,
    /// `None` when the price text was not numeric
    pub price: Option<f64>,
    pub link: Option<String>,
    pub image_url: Option<String>,
    /// Local time as shown by the site; `None` when the date could not be read
    pub posted_at: Option<NaiveDateTime>,
    /// Posted by a dealer, a showcase ad or already sold
    pub is_dealer: bool,
    /// The fragment exactly as it appeared on the page, kept for snapshots
    #[serde(skip)]
    pub raw_html: String,
}

impl Listing {
    /// Price rendered with the currency suffix used in notifications.
    pub fn price_label(&self) -> String {
        match self.price {
            Some(price) => format!("{} €", price),
            None => "Prezzo non specificato".to_string(),
        }
    }
}
