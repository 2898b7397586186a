//! HTTP client for catalogue crawling
//!
//! Sends every request with a fixed browser-style identification header.
//! There is no retry and no backoff: a non-success status fails the fetch.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::config::defaults;
use super::document_source::{DocumentFetcher, FetchError, FetchResult};

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::HTTP_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Fetch URL and return the body text
    pub async fn get_text(&self, url: &str) -> FetchResult<String> {
        tracing::debug!("Fetching URL: {}", url);

        let network = |source| FetchError::Network {
            locator: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                locator: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(network)?;
        tracing::debug!("Fetched {} ({}, {} bytes)", url, status, text.len());
        Ok(text)
    }
}

#[async_trait]
impl DocumentFetcher for HttpClient {
    async fn fetch(&self, locator: &str) -> FetchResult<String> {
        self.get_text(locator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        let client = HttpClient::new(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_user_agent_is_rejected() {
        let config = HttpClientConfig {
            user_agent: "bad\nagent".to_string(),
            ..HttpClientConfig::default()
        };
        assert!(HttpClient::new(config).is_err());
    }
}
