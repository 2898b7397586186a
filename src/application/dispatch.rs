//! Per-item detail enrichment and its two schedulers
//!
//! Both schedulers drive the same unit of work, [`Enricher::enrich`], and
//! return one page worth of records in listing order or the first failure.
//! Neither touches the crawl accumulator.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::crawl_error::{CrawlError, CrawlResult};
use crate::domain::product::{EnrichedRecord, ItemSummary};
use crate::infrastructure::document_source::DocumentFetcher;
use crate::infrastructure::parsing::{DetailPageParser, DetailParseContext};

/// Fetches, parses and merges the detail page of one summary
#[derive(Clone)]
pub struct Enricher {
    fetcher: Arc<dyn DocumentFetcher>,
    parser: Arc<DetailPageParser>,
}

impl Enricher {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, parser: DetailPageParser) -> Self {
        Self {
            fetcher,
            parser: Arc::new(parser),
        }
    }

    /// Build the enriched record for one summary.
    pub async fn enrich(&self, page: u32, index: usize, summary: ItemSummary) -> CrawlResult<EnrichedRecord> {
        let document = self
            .fetcher
            .fetch(&summary.detail_locator)
            .await
            .map_err(|source| CrawlError::Fetch {
                page,
                locator: summary.detail_locator.clone(),
                source,
            })?;

        let context = DetailParseContext::new(summary.detail_locator.as_str()).with_source(page, index);
        let detail = self.parser.parse_detail(&document, &context);
        debug!("Enriched item {} of page {}: {}", index, page, summary.title);
        Ok(EnrichedRecord::new(summary, detail))
    }

    /// One item at a time, in listing order.
    pub async fn enrich_sequential(&self, page: u32, summaries: Vec<ItemSummary>) -> CrawlResult<Vec<EnrichedRecord>> {
        let mut records = Vec::with_capacity(summaries.len());
        for (index, summary) in summaries.into_iter().enumerate() {
            records.push(self.enrich(page, index, summary).await?);
        }
        Ok(records)
    }

    /// One task per item with at most `page_budget` in flight.
    ///
    /// Results land in a slot per listing index, so the returned order is the
    /// listing order whatever the completion order. The first failure to
    /// complete aborts the remaining tasks of the page.
    pub async fn enrich_concurrent(
        &self,
        page: u32,
        summaries: Vec<ItemSummary>,
        page_budget: Option<usize>,
    ) -> CrawlResult<Vec<EnrichedRecord>> {
        let total = summaries.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let width = page_budget.unwrap_or(total).clamp(1, total);
        let semaphore = Arc::new(Semaphore::new(width));
        debug!("Dispatching {} detail fetches for page {} (width {})", total, page, width);

        let mut tasks = JoinSet::new();
        for (index, summary) in summaries.into_iter().enumerate() {
            let enricher = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let locator = summary.detail_locator.clone();
                let _permit = semaphore.acquire_owned().await.map_err(|e| CrawlError::Worker {
                    page,
                    locator: locator.clone(),
                    reason: format!("permit unavailable: {e}"),
                })?;

                let outcome = AssertUnwindSafe(enricher.enrich(page, index, summary))
                    .catch_unwind()
                    .await
                    .map_err(|_| CrawlError::Worker {
                        page,
                        locator,
                        reason: "worker panicked".to_string(),
                    })?;
                outcome.map(|record| (index, record))
            });
        }

        let mut slots: Vec<Option<EnrichedRecord>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(|e| CrawlError::Worker {
                page,
                locator: format!("page {page}"),
                reason: e.to_string(),
            });
            match outcome.and_then(|result| result) {
                Ok((index, record)) => slots[index] = Some(record),
                Err(error) => {
                    warn!("Aborting {} remaining detail fetches on page {}", tasks.len(), page);
                    tasks.abort_all();
                    return Err(error);
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| CrawlError::Worker {
                    page,
                    locator: format!("item {index}"),
                    reason: "worker finished without a record".to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rating::Rating;
    use crate::infrastructure::document_source::{FetchError, FetchResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves a minimal detail page whose category is the locator; later
    /// items answer sooner so completion order is reversed.
    struct ReversedDelayFetcher {
        fail_on: Option<String>,
    }

    #[async_trait]
    impl DocumentFetcher for ReversedDelayFetcher {
        async fn fetch(&self, locator: &str) -> FetchResult<String> {
            let index: u64 = locator.trim_start_matches("item-").parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(5 * (10 - index.min(10)))).await;
            if self.fail_on.as_deref() == Some(locator) {
                return Err(FetchError::invalid_locator(locator, "scripted failure"));
            }
            Ok(format!(
                r#"<ul class="breadcrumb"><li><a>Home</a></li><li><a>Books</a></li><li><a>{locator}</a></li></ul>"#
            ))
        }
    }

    /// Tracks how many fetches are running at once and how many were started.
    #[derive(Default)]
    struct CountingFetcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl DocumentFetcher for CountingFetcher {
        async fn fetch(&self, locator: &str) -> FetchResult<String> {
            self.started.fetch_add(1, Ordering::SeqCst);
            if self.fail_on.as_deref() == Some(locator) {
                return Err(FetchError::invalid_locator(locator, "scripted failure"));
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok("<html></html>".to_string())
        }
    }

    struct PanickingFetcher;

    #[async_trait]
    impl DocumentFetcher for PanickingFetcher {
        async fn fetch(&self, locator: &str) -> FetchResult<String> {
            if locator == "item-1" {
                panic!("fetcher blew up on {locator}");
            }
            Ok("<html></html>".to_string())
        }
    }

    fn summaries(n: usize) -> Vec<ItemSummary> {
        (0..n)
            .map(|i| ItemSummary {
                title: format!("Book {i}"),
                detail_locator: format!("item-{i}"),
                price: 1.0,
                rating: Rating::from_value(1),
                availability_text: "In stock".to_string(),
            })
            .collect()
    }

    fn enricher(fail_on: Option<&str>) -> Enricher {
        Enricher::new(
            Arc::new(ReversedDelayFetcher {
                fail_on: fail_on.map(str::to_string),
            }),
            DetailPageParser::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential_order() {
        let enricher = enricher(None);
        let sequential = enricher.enrich_sequential(1, summaries(8)).await.unwrap();
        for budget in [None, Some(1), Some(3), Some(100)] {
            let concurrent = enricher.enrich_concurrent(1, summaries(8), budget).await.unwrap();
            assert_eq!(concurrent, sequential, "budget {budget:?}");
        }
        let categories: Vec<_> = sequential
            .iter()
            .map(|r| r.detail().category.clone().unwrap())
            .collect();
        assert_eq!(categories, (0..8).map(|i| format!("item-{i}")).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_concurrent_failure_names_locator() {
        let err = enricher(Some("item-4"))
            .enrich_concurrent(3, summaries(8), Some(2))
            .await
            .unwrap_err();
        assert_eq!(err.locator(), Some("item-4"));
        assert_eq!(err.page(), Some(3));
    }

    #[tokio::test]
    async fn test_sequential_failure_stops_at_item() {
        let err = enricher(Some("item-2"))
            .enrich_sequential(1, summaries(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Fetch { ref locator, .. } if locator == "item-2"));
    }

    #[tokio::test]
    async fn test_budget_bounds_fetches_in_flight() {
        for budget in [1, 3] {
            let fetcher = Arc::new(CountingFetcher::default());
            let records = Enricher::new(fetcher.clone(), DetailPageParser::new().unwrap())
                .enrich_concurrent(1, summaries(12), Some(budget))
                .await
                .unwrap();
            assert_eq!(records.len(), 12);
            assert_eq!(fetcher.started.load(Ordering::SeqCst), 12);
            assert_eq!(fetcher.peak.load(Ordering::SeqCst), budget, "budget {budget}");
        }
    }

    #[tokio::test]
    async fn test_unbounded_budget_uses_page_width() {
        let fetcher = Arc::new(CountingFetcher::default());
        Enricher::new(fetcher.clone(), DetailPageParser::new().unwrap())
            .enrich_concurrent(1, summaries(6), None)
            .await
            .unwrap();
        assert_eq!(fetcher.peak.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_failure_cancels_waiting_units() {
        let fetcher = Arc::new(CountingFetcher {
            fail_on: Some("item-0".to_string()),
            ..CountingFetcher::default()
        });
        let err = Enricher::new(fetcher.clone(), DetailPageParser::new().unwrap())
            .enrich_concurrent(2, summaries(12), Some(2))
            .await
            .unwrap_err();
        assert_eq!(err.locator(), Some("item-0"));

        // Aborted units must not start fetching once the page has failed.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let started = fetcher.started.load(Ordering::SeqCst);
        assert!(started < 12, "{started} fetches started after the first failure");
    }

    #[tokio::test]
    async fn test_panicking_unit_becomes_worker_error() {
        let err = Enricher::new(Arc::new(PanickingFetcher), DetailPageParser::new().unwrap())
            .enrich_concurrent(5, summaries(3), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Worker { .. }), "{err}");
        assert_eq!(err.page(), Some(5));
        assert_eq!(err.locator(), Some("item-1"));
    }

    #[tokio::test]
    async fn test_empty_page() {
        assert!(enricher(None).enrich_concurrent(1, Vec::new(), None).await.unwrap().is_empty());
    }
}
