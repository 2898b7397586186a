//! Domain module - records produced by a catalogue crawl
//!
//! - `product`: item summaries, detail attributes and the enriched record set
//! - `rating`: star rating vocabulary
//! - `pagination`: traversal cursor and visited-page tracking

pub mod pagination;
pub mod product;
pub mod rating;

pub use pagination::{CrawlCursor, VisitedPages};
pub use product::{EnrichedRecord, FeatureGap, ItemDetail, ItemSummary, RecordSet};
pub use rating::Rating;
