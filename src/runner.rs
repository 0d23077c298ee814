use crate::models::Listing;
use crate::notify::Notifier;
use crate::scrapers::{PageSource, ScrapeEngine, SearchDefinition};
use crate::snapshot;
use crate::storage::{start_of_day, FreshnessStore};
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Listings found by one search in this run
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub search_key: String,
    pub listings: Vec<Listing>,
}

/// Runs every configured search in order and routes what they find
pub struct SearchRunner<'a> {
    source: &'a dyn PageSource,
    store: &'a FreshnessStore,
    notifier: Option<&'a dyn Notifier>,
    snapshot_dir: Option<PathBuf>,
    notify_delay: Duration,
    clock: fn() -> NaiveDateTime,
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl<'a> SearchRunner<'a> {
    pub fn new(source: &'a dyn PageSource, store: &'a FreshnessStore) -> Self {
        Self {
            source,
            store,
            notifier: None,
            snapshot_dir: None,
            notify_delay: Duration::from_secs(1),
            clock: local_now,
        }
    }

    /// Send every accepted listing through `notifier`
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Write one HTML snapshot per search into `dir`
    pub fn with_snapshots(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Pause between two notifications
    pub fn with_notify_delay(mut self, delay: Duration) -> Self {
        self.notify_delay = delay;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Run all searches sequentially.
    ///
    /// A search whose pages fail to load yields nothing and keeps its stored
    /// boundary; the other searches go on. Freshness file errors abort the run.
    pub async fn run(&self, searches: &[SearchDefinition]) -> Result<Vec<SearchResult>> {
        let mut results = Vec::with_capacity(searches.len());

        for search in searches {
            let result = self.run_search(search).await?;
            self.route(&result).await;
            results.push(result);
        }

        Ok(results)
    }

    async fn run_search(&self, search: &SearchDefinition) -> Result<SearchResult> {
        let search_key = search.search_key();
        let now = (self.clock)();
        let stored = self.store.lookup(&search_key)?;
        let boundary = stored.unwrap_or_else(|| start_of_day(now));

        info!("🔎 Search '{}' (new since {})", search_key, boundary);

        let engine = ScrapeEngine::new(self.source);
        let outcome = match engine.scrape(search, boundary, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Search '{}' failed: {:#}", search_key, e);
                return Ok(SearchResult {
                    search_key,
                    listings: Vec::new(),
                });
            }
        };

        // A first run always creates the record; later runs only move it forward
        match outcome.boundary_candidate {
            Some(candidate) if stored.is_none() || candidate > boundary => {
                self.store.update(&search_key, candidate)?;
                info!(
                    "Boundary for '{}' moved to {} in {}",
                    search_key,
                    candidate,
                    self.store.path().display()
                );
            }
            _ => debug!("Boundary for '{}' unchanged", search_key),
        }

        info!(
            "✅ '{}': {} new listings over {} pages{}",
            search_key,
            outcome.listings.len(),
            outcome.pages_fetched,
            if outcome.stopped_at_stale { " (caught up)" } else { "" }
        );

        Ok(SearchResult {
            search_key,
            listings: outcome.listings,
        })
    }

    async fn route(&self, result: &SearchResult) {
        if let Some(notifier) = self.notifier {
            for (i, listing) in result.listings.iter().enumerate() {
                if i > 0 {
                    tokio::time::sleep(self.notify_delay).await;
                }
                if let Err(e) = notifier.notify(listing, &result.search_key).await {
                    warn!("{} notification failed: {:#}", notifier.channel_name(), e);
                }
            }
        }

        if let Some(dir) = &self.snapshot_dir {
            if let Err(e) = snapshot::save_snapshot(dir, &result.search_key, &result.listings).await
            {
                warn!("Snapshot for '{}' failed: {:#}", result.search_key, e);
            }
        }
    }
}
