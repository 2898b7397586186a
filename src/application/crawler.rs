//! Catalogue traversal
//!
//! Walks listing pages by following their "next" control, enriches every
//! summary of a page and appends the page to the record set only once all of
//! its items succeeded. The first failure ends the crawl.

use std::sync::Arc;

use tracing::{info, warn};

use super::crawl_error::{CrawlError, CrawlResult};
use super::dispatch::Enricher;
use crate::domain::pagination::{CrawlCursor, VisitedPages};
use crate::domain::product::RecordSet;
use crate::infrastructure::config::{AppConfig, DispatchConfig, DispatchKind};
use crate::infrastructure::document_source::DocumentFetcher;
use crate::infrastructure::parsing::{DetailPageParser, ListingPageParser, ParseContext, ParsingConfig};

/// How the per-item detail step of a page is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    #[default]
    Sequential,
    /// At most `page_budget` detail fetches in flight; `None` means the page size
    Concurrent { page_budget: Option<usize> },
}

impl DispatchMode {
    /// Concurrent mode; a zero budget is rejected.
    pub fn concurrent(page_budget: Option<usize>) -> CrawlResult<Self> {
        if page_budget == Some(0) {
            return Err(CrawlError::Configuration(
                "page budget must be at least 1".to_string(),
            ));
        }
        Ok(Self::Concurrent { page_budget })
    }

    pub fn from_config(config: &DispatchConfig) -> CrawlResult<Self> {
        match config.mode {
            DispatchKind::Sequential => Ok(Self::Sequential),
            DispatchKind::Concurrent => Self::concurrent(config.page_budget),
        }
    }
}

/// Outcome of a finished crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Listing pages fully processed
    pub pages: u32,
    /// Records appended by this crawl
    pub records: usize,
    /// Whether the page cap stopped the traversal before the last page
    pub truncated: bool,
}

pub struct Crawler {
    fetcher: Arc<dyn DocumentFetcher>,
    listing_parser: ListingPageParser,
    enricher: Enricher,
    mode: DispatchMode,
    max_pages: Option<u32>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, parsing: &ParsingConfig, mode: DispatchMode) -> CrawlResult<Self> {
        if let DispatchMode::Concurrent { page_budget: Some(0) } = mode {
            return Err(CrawlError::Configuration(
                "page budget must be at least 1".to_string(),
            ));
        }
        let listing_parser = ListingPageParser::with_config(parsing)?;
        let enricher = Enricher::new(Arc::clone(&fetcher), DetailPageParser::with_config(parsing)?);
        Ok(Self {
            fetcher,
            listing_parser,
            enricher,
            mode,
            max_pages: None,
        })
    }

    /// Build a crawler from loaded settings.
    pub fn from_config(config: &AppConfig, fetcher: Arc<dyn DocumentFetcher>) -> CrawlResult<Self> {
        let mode = DispatchMode::from_config(&config.dispatch)?;
        Ok(Self::new(fetcher, &config.parsing_config(), mode)?.with_max_pages(config.crawl.max_pages))
    }

    /// Stop after `max_pages` listing pages.
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub const fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Crawl from `start`, appending to `records` page by page.
    ///
    /// On failure `records` keeps every page completed before the failing
    /// one and nothing from it.
    pub async fn crawl_into(&self, start: &str, records: &mut RecordSet) -> CrawlResult<CrawlStats> {
        let mut cursor = CrawlCursor::start(start);
        let mut visited = VisitedPages::new();
        let mut stats = CrawlStats::default();

        info!("Starting crawl at {} ({:?})", start, self.mode);

        while let Some(locator) = cursor.locator().map(str::to_string) {
            if let Some(max_pages) = self.max_pages {
                if stats.pages >= max_pages {
                    warn!("Page cap of {} reached; not following {}", max_pages, locator);
                    stats.truncated = true;
                    break;
                }
            }
            if !visited.mark(&locator) {
                return Err(CrawlError::CycleDetected { locator });
            }

            let page = stats.pages + 1;
            let document = self
                .fetcher
                .fetch(&locator)
                .await
                .map_err(|source| CrawlError::Fetch {
                    page,
                    locator: locator.clone(),
                    source,
                })?;

            let listing = self
                .listing_parser
                .parse_listing(&document, &ParseContext::new(page, locator.as_str()))
                .map_err(|source| CrawlError::Structure {
                    page,
                    locator: locator.clone(),
                    source,
                })?;

            let summary_count = listing.summaries.len();
            let enriched = match self.mode {
                DispatchMode::Sequential => self.enricher.enrich_sequential(page, listing.summaries).await?,
                DispatchMode::Concurrent { page_budget } => {
                    self.enricher
                        .enrich_concurrent(page, listing.summaries, page_budget)
                        .await?
                }
            };

            records.extend_page(enriched);
            stats.pages = page;
            stats.records += summary_count;
            info!("Page {} done: {} items ({} total)", page, summary_count, records.len());

            cursor = CrawlCursor::advance(listing.next_locator);
        }

        info!("Crawl finished: {} pages, {} records", stats.pages, stats.records);
        Ok(stats)
    }

    /// Crawl into a fresh record set.
    pub async fn crawl(&self, start: &str) -> CrawlResult<RecordSet> {
        let mut records = RecordSet::new();
        self.crawl_into(start, &mut records).await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::document_source::FileFetcher;

    #[test]
    fn test_zero_budget_rejected() {
        assert!(matches!(
            DispatchMode::concurrent(Some(0)),
            Err(CrawlError::Configuration(_))
        ));
        assert!(Crawler::new(
            Arc::new(FileFetcher::new()),
            &ParsingConfig::default(),
            DispatchMode::Concurrent { page_budget: Some(0) },
        )
        .is_err());
    }

    #[test]
    fn test_mode_from_config() {
        let config = DispatchConfig {
            mode: DispatchKind::Concurrent,
            page_budget: Some(4),
        };
        assert_eq!(
            DispatchMode::from_config(&config).unwrap(),
            DispatchMode::Concurrent { page_budget: Some(4) }
        );
        assert_eq!(
            DispatchMode::from_config(&DispatchConfig::default()).unwrap(),
            DispatchMode::Sequential
        );
    }
}
