//! Per-listing acceptance rules.
//!
//! Missing data never excludes a listing: an ad without a readable price or
//! date is shown rather than dropped.

use crate::models::Listing;
use crate::scrapers::types::DEFAULT_MAX_PRICE;
use chrono::NaiveDateTime;

/// Price bounds of a search, with defaults already applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min: min.unwrap_or(0.0),
            max: max.unwrap_or(DEFAULT_MAX_PRICE),
        }
    }
}

pub fn price_in_range(listing: &Listing, range: PriceRange) -> bool {
    match listing.price {
        Some(price) => range.min <= price && price <= range.max,
        None => true,
    }
}

pub fn not_dealer(listing: &Listing) -> bool {
    !listing.is_dealer
}

/// Strictly newer than `boundary`; undated listings count as fresh
pub fn is_fresh(listing: &Listing, boundary: NaiveDateTime) -> bool {
    match listing.posted_at {
        Some(posted_at) => posted_at > boundary,
        None => true,
    }
}

pub fn accept(listing: &Listing, range: PriceRange, boundary: NaiveDateTime) -> bool {
    price_in_range(listing, range) && not_dealer(listing) && is_fresh(listing, boundary)
}
