//! listing-watch: one run per invocation (schedule it with cron or CI).
//! Fetches every configured source, emails keyword-matching listings not
//! reported before, and persists the seen store.

use anyhow::{Context, Result};
use listing_watch::config::{AppConfig, SourcesConfig};
use listing_watch::ingest::http::HttpFetcher;
use listing_watch::metrics::Metrics;
use listing_watch::{notify, run_once, KeywordSet, Pipeline};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    listing_watch::init_tracing();

    info!("=== listing-watch starting ===");
    let cfg = AppConfig::from_env();

    let metrics = match &cfg.metrics_textfile {
        Some(p) => Some(Metrics::init(p)?),
        None => None,
    };

    let keywords = KeywordSet::load_or_empty();
    let fetcher = HttpFetcher::new(cfg.http.clone())?;
    let sources = SourcesConfig::load_from(&cfg.sources_path)?
        .build(&fetcher)
        .context("building sources")?;
    let notifier = notify::from_config(&cfg)?;

    let pipeline = Pipeline::new(keywords, sources).with_inter_source_delay(cfg.inter_source_delay);
    let summary = run_once(&pipeline, &cfg.seen_path, notifier.as_ref()).await?;

    let failed: Vec<_> = summary.report.failed_sources().collect();
    info!(
        new = summary.report.new_listings.len(),
        notified = summary.notified,
        failed_sources = ?failed,
        "run complete"
    );

    if let Some(m) = metrics {
        if let Err(e) = m.write_textfile() {
            error!(error = ?e, "could not write metrics textfile");
        }
    }
    Ok(())
}
