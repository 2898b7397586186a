//! Application layer: traversal control and per-item dispatch

pub mod crawl_error;
pub mod crawler;
pub mod dispatch;

pub use crawl_error::{CrawlError, CrawlResult};
pub use crawler::{CrawlStats, Crawler, DispatchMode};
pub use dispatch::Enricher;
