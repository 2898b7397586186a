//! Document retrieval
//!
//! A locator is either a network address (`http://`, `https://`) or a local
//! path (plain or `file://`). Fetchers return the raw document text and never
//! retry.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::http_client::HttpClient;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request for {locator} failed with status {status}")]
    Status { locator: String, status: u16 },

    #[error("Network error fetching {locator}: {source}")]
    Network {
        locator: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },
}

impl FetchError {
    pub fn invalid_locator(locator: &str, reason: &str) -> Self {
        Self::InvalidLocator {
            locator: locator.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Locator the failed fetch was addressed to
    pub fn locator(&self) -> &str {
        match self {
            Self::Status { locator, .. }
            | Self::Network { locator, .. }
            | Self::Io { locator, .. }
            | Self::InvalidLocator { locator, .. } => locator,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Source of listing and detail documents
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Retrieve the raw document behind `locator`.
    async fn fetch(&self, locator: &str) -> FetchResult<String>;
}

/// Whether the locator addresses the network.
pub fn is_network_locator(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

/// Reads documents from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FileFetcher;

impl FileFetcher {
    pub const fn new() -> Self {
        Self
    }

    fn to_path(locator: &str) -> FetchResult<PathBuf> {
        if locator.starts_with("file://") {
            return Url::parse(locator)
                .map_err(|e| FetchError::invalid_locator(locator, &e.to_string()))?
                .to_file_path()
                .map_err(|()| FetchError::invalid_locator(locator, "not a local file URL"));
        }
        if locator.trim().is_empty() {
            return Err(FetchError::invalid_locator(locator, "empty path"));
        }
        Ok(PathBuf::from(locator))
    }
}

#[async_trait]
impl DocumentFetcher for FileFetcher {
    async fn fetch(&self, locator: &str) -> FetchResult<String> {
        let path = Self::to_path(locator)?;
        let bytes = tokio::fs::read(&path).await.map_err(|source| FetchError::Io {
            locator: locator.to_string(),
            source,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Dispatches to the network or the filesystem depending on the locator form
pub struct LocatorFetcher {
    http: HttpClient,
    files: FileFetcher,
}

impl LocatorFetcher {
    pub const fn new(http: HttpClient) -> Self {
        Self {
            http,
            files: FileFetcher::new(),
        }
    }
}

#[async_trait]
impl DocumentFetcher for LocatorFetcher {
    async fn fetch(&self, locator: &str) -> FetchResult<String> {
        if locator.trim().is_empty() {
            return Err(FetchError::invalid_locator(locator, "empty locator"));
        }
        if is_network_locator(locator) {
            self.http.fetch(locator).await
        } else {
            self.files.fetch(locator).await
        }
    }
}
