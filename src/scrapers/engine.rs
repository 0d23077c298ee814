use crate::filters;
use crate::models::Listing;
use crate::scrapers::parser;
use crate::scrapers::traits::PageSource;
use crate::scrapers::types::SearchDefinition;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::time::Duration;
use tracing::{debug, info};

/// Result of walking the pages of one search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeOutcome {
    /// Accepted listings, newest first
    pub listings: Vec<Listing>,
    /// Posting time of the newest listing on page 1, to become the next boundary
    pub boundary_candidate: Option<NaiveDateTime>,
    pub pages_fetched: u32,
    /// True when paging stopped at an already seen listing
    pub stopped_at_stale: bool,
}

/// Incremental scraper for a single search.
///
/// Pages are walked in order until a listing not newer than the boundary
/// shows up, a page comes back empty, or `pages_to_scan` is reached. This
/// relies on the `PageSource` ordering contract: newest first, no older
/// listing ever placed ahead of a newer one.
pub struct ScrapeEngine<'a, S: PageSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: PageSource + ?Sized> ScrapeEngine<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Scrape `search`, keeping only listings strictly newer than `boundary`.
    ///
    /// `now` anchors relative dates on the page. A page failure aborts the
    /// whole search.
    pub async fn scrape(
        &self,
        search: &SearchDefinition,
        boundary: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<ScrapeOutcome> {
        let range = search.price_range();
        let delay = Duration::try_from_secs_f64(search.request_delay_seconds).unwrap_or_default();
        let mut outcome = ScrapeOutcome::default();

        for page in 1..=search.pages_to_scan {
            let html = self.source.fetch_page(search, page).await.with_context(|| {
                format!("Failed to fetch page {} from {}", page, self.source.source_name())
            })?;
            outcome.pages_fetched = page;

            let listings = parser::parse_page(&html, now);
            debug!("Page {}: {} listings", page, listings.len());

            if listings.is_empty() {
                debug!("Page {} is empty, no more results", page);
                break;
            }

            if page == 1 {
                outcome.boundary_candidate = listings[0].posted_at;
            }

            for listing in listings {
                if !filters::is_fresh(&listing, boundary) {
                    info!(
                        "Reached already seen listing on page {} ({:?}), stopping",
                        page, listing.posted_at
                    );
                    outcome.stopped_at_stale = true;
                    return Ok(outcome);
                }

                if filters::accept(&listing, range, boundary) {
                    outcome.listings.push(listing);
                }
            }

            if page < search.pages_to_scan {
                tokio::time::sleep(delay).await;
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Serves canned pages and records which ones were requested
    struct FakeSource {
        pages: Vec<Result<String, String>>,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeSource {
        fn new(pages: Vec<String>) -> Self {
            Self {
                pages: pages.into_iter().map(Ok).collect(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_page(&self, _search: &SearchDefinition, page: u32) -> Result<String> {
            self.requested.lock().unwrap().push(page);
            match self.pages.get(page as usize - 1) {
                Some(Ok(html)) => Ok(html.clone()),
                Some(Err(msg)) => Err(anyhow::anyhow!(msg.clone())),
                None => Ok(String::new()),
            }
        }

        fn source_name(&self) -> &'static str {
            "Fake"
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap()
    }

    fn boundary() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn card(title: &str, price: &str, date: &str, badge: &str) -> String {
        format!(
            r#"<div class="item-card"><a href="/{title}"><h2>{title}</h2></a>
               <p class="price">{price}&nbsp;€</p>{badge}
               <span class="city">Roma</span><span>{date}</span></div>"#
        )
    }

    fn page(cards: &[String]) -> String {
        format!("<html><body>{}</body></html>", cards.join("\n"))
    }

    fn search(pages: u32) -> SearchDefinition {
        let mut search = SearchDefinition::new("bici");
        search.pages_to_scan = pages;
        search.request_delay_seconds = 0.0;
        search
    }

    fn titles(outcome: &ScrapeOutcome) -> Vec<String> {
        outcome
            .listings
            .iter()
            .map(|l| l.title.clone().unwrap_or_default())
            .collect()
    }

    #[tokio::test]
    async fn test_stops_at_first_stale_listing() {
        let source = FakeSource::new(vec![
            page(&[
                card("a", "100", "Oggi alle 15:00", ""),
                card("b", "100", "Oggi alle 13:00", ""),
                card("c", "100", "Oggi alle 11:00", ""),
            ]),
            page(&[card("d", "100", "Oggi alle 10:00", "")]),
        ]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search(2), boundary(), now())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["a", "b"]);
        assert!(outcome.stopped_at_stale);
        assert_eq!(source.requested(), vec![1]);
        assert_eq!(outcome.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_walks_pages_until_limit() {
        let source = FakeSource::new(vec![
            page(&[card("a", "10", "Oggi alle 19:00", "")]),
            page(&[card("b", "10", "Oggi alle 18:00", "")]),
            page(&[card("c", "10", "Oggi alle 17:00", "")]),
        ]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search(2), boundary(), now())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["a", "b"]);
        assert!(!outcome.stopped_at_stale);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_page_ends_search() {
        let source = FakeSource::new(vec![
            page(&[card("a", "10", "Oggi alle 19:00", "")]),
            page(&[]),
            page(&[card("c", "10", "Oggi alle 17:00", "")]),
        ]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search(5), boundary(), now())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["a"]);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_first_page_gives_no_candidate() {
        let source = FakeSource::new(vec![page(&[])]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search(3), boundary(), now())
            .await
            .unwrap();

        assert!(outcome.listings.is_empty());
        assert_eq!(outcome.boundary_candidate, None);
    }

    #[tokio::test]
    async fn test_candidate_is_first_listing_of_first_page() {
        // The first card is a dealer and gets filtered, it still sets the candidate
        let source = FakeSource::new(vec![
            page(&[
                card("dealer", "10", "Oggi alle 19:30", "<span>Rivenditore</span>"),
                card("a", "10", "Oggi alle 19:00", ""),
            ]),
            page(&[card("b", "10", "Oggi alle 18:00", "")]),
        ]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search(2), boundary(), now())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["a", "b"]);
        let expected = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(19, 30, 0)
            .unwrap();
        assert_eq!(outcome.boundary_candidate, Some(expected));
    }

    #[tokio::test]
    async fn test_candidate_captured_even_when_all_stale() {
        let source = FakeSource::new(vec![page(&[card("old", "10", "Ieri alle 19:00", "")])]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search(2), boundary(), now())
            .await
            .unwrap();

        assert!(outcome.listings.is_empty());
        assert!(outcome.stopped_at_stale);
        assert!(outcome.boundary_candidate.unwrap() < boundary());
    }

    #[tokio::test]
    async fn test_filters_price_and_dealers_without_stopping() {
        let mut search = search(1);
        search.min_price = Some(50.0);
        search.max_price = Some(150.0);

        let source = FakeSource::new(vec![page(&[
            card("cheap", "10", "Oggi alle 19:00", ""),
            card("ok", "100", "Oggi alle 18:50", ""),
            card("sold", "100", "Oggi alle 18:40", r#"<span class="item-sold-badge">Venduto</span>"#),
            card("pricey", "1.500", "Oggi alle 18:30", ""),
            card("free text", "Trattabile", "Oggi alle 18:20", ""),
        ])]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search, boundary(), now())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["ok", "free text"]);
        assert!(outcome.listings[1].price.is_none());
    }

    #[tokio::test]
    async fn test_undated_listings_never_stop_paging() {
        let source = FakeSource::new(vec![
            page(&[card("undated", "10", "data sconosciuta", "")]),
            page(&[card("b", "10", "Oggi alle 18:00", "")]),
        ]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search(2), boundary(), now())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["undated", "b"]);
        assert_eq!(outcome.boundary_candidate, None);
    }

    #[tokio::test]
    async fn test_out_of_order_source_hides_later_listings() {
        // Ordering contract violated: a fresh listing behind a stale one is lost
        let source = FakeSource::new(vec![page(&[
            card("a", "10", "Oggi alle 19:00", ""),
            card("stale", "10", "Oggi alle 09:00", ""),
            card("fresh but late", "10", "Oggi alle 18:00", ""),
        ])]);

        let outcome = ScrapeEngine::new(&source)
            .scrape(&search(1), boundary(), now())
            .await
            .unwrap();

        assert_eq!(titles(&outcome), vec!["a"]);
    }

    #[tokio::test]
    async fn test_page_failure_aborts_search() {
        let source = FakeSource {
            pages: vec![
                Ok(page(&[card("a", "10", "Oggi alle 19:00", "")])),
                Err("connection reset".to_string()),
            ],
            requested: Mutex::new(Vec::new()),
        };

        let err = ScrapeEngine::new(&source)
            .scrape(&search(3), boundary(), now())
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("connection reset"));
        assert_eq!(source.requested(), vec![1, 2]);
    }
}
