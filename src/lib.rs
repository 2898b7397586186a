//! Catalogue crawler
//!
//! Walks a paginated product catalogue, follows every listing entry to its
//! detail page and flattens both into one ordered record set written as CSV.
//! Detail pages can be fetched one at a time or concurrently per listing page
//! with identical output.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CrawlError, CrawlResult, CrawlStats, Crawler, DispatchMode};
pub use domain::{EnrichedRecord, ItemDetail, ItemSummary, Rating, RecordSet};
pub use infrastructure::{AppConfig, DocumentFetcher, FetchError, FileFetcher, HttpClient, LocatorFetcher};
