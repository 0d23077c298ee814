pub mod engine;
pub mod parser;
pub mod subito;
pub mod traits;
pub mod types;

pub use engine::ScrapeEngine;
pub use subito::SubitoScraper;
pub use traits::PageSource;
pub use types::SearchDefinition;
