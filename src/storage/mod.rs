pub mod freshness;

pub use freshness::{start_of_day, FreshnessStore};
