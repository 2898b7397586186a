//! Configuration infrastructure
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `CATALOGUE_CRAWLER_*` environment variables (`__` separates nested keys,
//! e.g. `CATALOGUE_CRAWLER_DISPATCH__PAGE_BUDGET=4`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::http_client::HttpClientConfig;
use super::parsing::ParsingConfig;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub http: HttpClientConfig,
    pub dispatch: DispatchConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Where the traversal starts and how relative locators resolve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// First listing page; defaults to `index.html` under the site root
    pub start_locator: Option<String>,

    /// Site root (network base URL or local directory)
    pub site_root: String,

    /// Directory under the site root holding the catalogue pages
    pub catalogue_dir: String,

    /// Stop after this many listing pages
    pub max_pages: Option<u32>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_locator: None,
            site_root: defaults::SITE_ROOT.to_string(),
            catalogue_dir: defaults::CATALOGUE_DIR.to_string(),
            max_pages: None,
        }
    }
}

impl CrawlConfig {
    pub fn start_locator(&self) -> String {
        self.start_locator.clone().unwrap_or_else(|| {
            format!("{}/{}", self.site_root.trim_end_matches('/'), defaults::START_PAGE)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchKind {
    #[default]
    Sequential,
    Concurrent,
}

/// Scheduling of the per-item detail step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub mode: DispatchKind,

    /// Maximum in-flight detail fetches per page; unset means the page size
    pub page_budget: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::OUTPUT_PATH),
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for the log file; the platform data directory when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        let path = std::env::var(defaults::CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .ok();
        match path {
            Some(path) => Self::load_from(Some(&path), true),
            None => Self::load_from(Some(Path::new(defaults::CONFIG_FILE)), false),
        }
    }

    /// Load configuration, optionally layering a TOML file over the defaults.
    pub fn load_from(path: Option<&Path>, required: bool) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default()).context("Failed to serialize defaults")?);

        if let Some(path) = path {
            if path.exists() {
                info!("Loading configuration from {}", path.display());
            }
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(required),
            );
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no crawl could run with.
    pub fn validate(&self) -> Result<()> {
        if self.crawl.site_root.trim().is_empty() {
            bail!("crawl.site_root must not be empty");
        }
        if let Some(start) = &self.crawl.start_locator {
            if start.trim().is_empty() {
                bail!("crawl.start_locator must not be empty when set");
            }
        }
        if self.crawl.max_pages == Some(0) {
            bail!("crawl.max_pages must be at least 1 when set");
        }
        if self.dispatch.page_budget == Some(0) {
            bail!("dispatch.page_budget must be at least 1 when set");
        }
        if self.http.user_agent.trim().is_empty() {
            bail!("http.user_agent must not be empty");
        }
        if self.output.path.as_os_str().is_empty() {
            bail!("output.path must not be empty");
        }
        Ok(())
    }

    /// Parser settings derived from the crawl roots
    pub fn parsing_config(&self) -> ParsingConfig {
        ParsingConfig::with_roots(&self.crawl.site_root, &self.crawl.catalogue_dir)
    }
}

/// Default configuration values
pub mod defaults {
    /// Default site root
    pub const SITE_ROOT: &str = "https://books.toscrape.com/";

    /// Directory under the site root holding listing and detail pages
    pub const CATALOGUE_DIR: &str = "catalogue/";

    /// First listing page under the site root
    pub const START_PAGE: &str = "index.html";

    /// Browser-style identification header sent with every request
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36";

    /// Default request timeout in seconds
    pub const HTTP_TIMEOUT_SECONDS: u64 = 30;

    /// Default CSV output file
    pub const OUTPUT_PATH: &str = "data/books_data.csv";

    /// Configuration file looked up in the working directory
    pub const CONFIG_FILE: &str = "catalogue-crawler.toml";

    /// Environment variable overriding the configuration file path
    pub const CONFIG_PATH_ENV: &str = "CATALOGUE_CRAWLER_CONFIG";

    /// Prefix of environment overrides
    pub const ENV_PREFIX: &str = "CATALOGUE_CRAWLER";

    // Log configuration defaults
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;

    /// Log file name inside the log directory
    pub const LOG_FILE_NAME: &str = "catalogue-crawler.log";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crawl.start_locator(), "https://books.toscrape.com/index.html");
        assert_eq!(config.dispatch.mode, DispatchKind::Sequential);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[crawl]
site_root = "/srv/books"
max_pages = 3

[dispatch]
mode = "concurrent"
page_budget = 4

[output]
path = "out/records.csv"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(Some(file.path()), true).unwrap();
        assert_eq!(config.crawl.site_root, "/srv/books");
        assert_eq!(config.crawl.catalogue_dir, defaults::CATALOGUE_DIR);
        assert_eq!(config.crawl.max_pages, Some(3));
        assert_eq!(config.crawl.start_locator(), "/srv/books/index.html");
        assert_eq!(config.dispatch.mode, DispatchKind::Concurrent);
        assert_eq!(config.dispatch.page_budget, Some(4));
        assert_eq!(config.output.path, PathBuf::from("out/records.csv"));
        assert_eq!(config.http.timeout_seconds, defaults::HTTP_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_zero_page_budget_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[dispatch]\nmode = \"concurrent\"\npage_budget = 0").unwrap();
        assert!(AppConfig::load_from(Some(file.path()), true).is_err());
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let config = AppConfig::load_from(Some(Path::new("/nonexistent/crawler.toml")), false).unwrap();
        assert_eq!(config.crawl.site_root, defaults::SITE_ROOT);
    }

    #[test]
    fn test_validate_rejects_empty_root() {
        let mut config = AppConfig::default();
        config.crawl.site_root = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
