//! Terminal crawl error
//!
//! Every failure that stops a crawl is reported as exactly one `CrawlError`
//! carrying the listing page number and the locator that failed.

use thiserror::Error;

use crate::infrastructure::document_source::FetchError;
use crate::infrastructure::parsing::ParsingError;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Fetch failed on listing page {page} for {locator}: {source}")]
    Fetch {
        page: u32,
        locator: String,
        #[source]
        source: FetchError,
    },

    #[error("Listing page {page} ({locator}) is malformed: {source}")]
    Structure {
        page: u32,
        locator: String,
        #[source]
        source: ParsingError,
    },

    #[error("Detail worker on listing page {page} for {locator} failed: {reason}")]
    Worker {
        page: u32,
        locator: String,
        reason: String,
    },

    #[error("Listing page {locator} was already visited; refusing to loop")]
    CycleDetected { locator: String },

    #[error("Invalid crawl configuration: {0}")]
    Configuration(String),
}

impl CrawlError {
    /// Locator the crawl stopped at, if the failure concerns one.
    pub fn locator(&self) -> Option<&str> {
        match self {
            Self::Fetch { locator, .. }
            | Self::Structure { locator, .. }
            | Self::Worker { locator, .. }
            | Self::CycleDetected { locator } => Some(locator),
            Self::Configuration(_) => None,
        }
    }

    /// Listing page number the failure occurred on.
    pub const fn page(&self) -> Option<u32> {
        match self {
            Self::Fetch { page, .. } | Self::Structure { page, .. } | Self::Worker { page, .. } => Some(*page),
            Self::CycleDetected { .. } | Self::Configuration(_) => None,
        }
    }
}

impl From<ParsingError> for CrawlError {
    fn from(error: ParsingError) -> Self {
        Self::Configuration(error.to_string())
    }
}

pub type CrawlResult<T> = Result<T, CrawlError>;
