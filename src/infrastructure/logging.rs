//! Logging system configuration and initialization
//!
//! - Console output (optional)
//! - File output via a non-blocking writer (optional)
//! - Structured JSON file logs (optional)
//! - `RUST_LOG` overrides the configured level

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

pub use crate::infrastructure::config::LoggingConfig;

use crate::infrastructure::config::defaults;

/// Keeps the file writer alive for the lifetime of the process
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Directory the log file is written to
pub fn get_log_directory(config: &LoggingConfig) -> PathBuf {
    config.log_dir.clone().unwrap_or_else(|| {
        dirs::data_local_dir()
            .map(|dir| dir.join("catalogue-crawler").join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    })
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LoggingConfig::default())
}

/// Filter for the configured level.
///
/// HTTP client internals are held at `info`/`warn` unless `trace` is
/// requested.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'"))?;

    if !level.to_lowercase().contains("trace") {
        for directive in ["reqwest=info", "hyper=warn", "hyper_util=warn", "h2=warn", "html5ever=warn", "selectors=warn"] {
            filter = filter.add_directive(directive.parse()?);
        }
    }
    Ok(filter)
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(&config.level)?,
    };

    let file_writer = if config.file_output {
        let log_dir = get_log_directory(&config);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let (writer, guard) = non_blocking(rolling::never(&log_dir, defaults::LOG_FILE_NAME));
        LOG_GUARD
            .set(guard)
            .map_err(|_| anyhow!("Logging already initialized"))?;
        Some(writer)
    } else {
        None
    };

    let (json_file_layer, plain_file_layer) = match file_writer {
        Some(writer) if config.json_format => (
            Some(
                fmt::Layer::new()
                    .json()
                    .with_writer(writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false),
            ),
            None,
        ),
        Some(writer) => (
            None,
            Some(
                fmt::Layer::new()
                    .with_writer(writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false)
                    .with_ansi(false),
            ),
        ),
        None => (None, None),
    };

    let console_layer = config.console_output.then(|| {
        fmt::Layer::new()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
    });

    Registry::default()
        .with(env_filter)
        .with(json_file_layer)
        .with(plain_file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

    tracing::info!(
        "Logging initialized (level: {}, console: {}, file: {}, json: {})",
        config.level,
        config.console_output,
        config.file_output,
        config.json_format
    );
    Ok(())
}
