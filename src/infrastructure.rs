//! Infrastructure layer for document retrieval, parsing, output and settings

pub mod config;
pub mod document_source;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod record_sink;

// Re-export commonly used items
pub use config::AppConfig;
pub use document_source::{DocumentFetcher, FetchError, FileFetcher, LocatorFetcher};
pub use http_client::{HttpClient, HttpClientConfig};
pub use parsing::{DetailPageParser, ListingPageParser, ParsingConfig, ParsingError, ParsingResult};
pub use record_sink::{read_records, write_records, SinkError};
