use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use catalogue_crawler::application::Crawler;
use catalogue_crawler::domain::RecordSet;
use catalogue_crawler::infrastructure::config::AppConfig;
use catalogue_crawler::infrastructure::logging::init_logging_with_config;
use catalogue_crawler::infrastructure::record_sink::write_records;
use catalogue_crawler::infrastructure::{HttpClient, LocatorFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging_with_config(config.logging.clone())?;

    let http = HttpClient::new(config.http.clone())?;
    let crawler = Crawler::from_config(&config, Arc::new(LocatorFetcher::new(http)))?;
    let start = config.crawl.start_locator();

    let mut records = RecordSet::new();
    let stats = match crawler.crawl_into(&start, &mut records).await {
        Ok(stats) => stats,
        Err(e) => {
            error!("Crawl aborted after {} records: {}", records.len(), e);
            return Err(e).context("Crawl failed; no output written");
        }
    };

    let gaps = records.feature_gaps();
    if !gaps.is_empty() {
        warn!(
            "{} of {} records lack columns required downstream",
            gaps.len(),
            records.len()
        );
        for gap in gaps.iter().take(10) {
            warn!("  row {} '{}': missing {}", gap.row, gap.title, gap.missing.join(", "));
        }
    }

    write_records(&config.output.path, &records)
        .with_context(|| format!("Failed to write {}", config.output.path.display()))?;

    info!(
        "Done: {} pages, {} records -> {}{}",
        stats.pages,
        stats.records,
        config.output.path.display(),
        if stats.truncated { " (page cap reached)" } else { "" }
    );
    Ok(())
}
