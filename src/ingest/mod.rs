// src/ingest/mod.rs
pub mod http;
pub mod providers;
pub mod seen;
pub mod types;

use anyhow::{Context, Result};
use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::ingest::seen::SeenStore;
use crate::ingest::types::{Listing, SourceAdapter};
use crate::keywords::KeywordSet;
use crate::notify::{Digest, Notifier};

/// One-time metrics registration (so series show up in the exposition).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("listings_fetched_total", "Listings returned by source adapters.");
        describe_counter!(
            "listings_matched_total",
            "Listings whose title matched a keyword."
        );
        describe_counter!(
            "listings_new_total",
            "Keyword-matching listings not seen before."
        );
        describe_counter!("source_errors_total", "Source fetch failures.");
        describe_histogram!("listings_parse_ms", "Adapter parse time in milliseconds.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the listing pipeline last completed."
        );
    });
}

/// A configured source: the store key plus the adapter that fetches it.
pub struct Source {
    pub key: String,
    pub label: String,
    pub adapter: Box<dyn SourceAdapter>,
}

impl Source {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        adapter: Box<dyn SourceAdapter>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            adapter,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub fetched: usize,
    pub matched: usize,
    pub new_listings: Vec<Listing>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Fetched {
        fetched: usize,
        matched: usize,
        new: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// All new listings across sources, in source order then adapter order.
    pub new_listings: Vec<Listing>,
    /// One entry per configured source, keyed by source key.
    pub sources: Vec<(String, SourceOutcome)>,
}

impl RunReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().filter_map(|(k, o)| match o {
            SourceOutcome::Failed { .. } => Some(k.as_str()),
            SourceOutcome::Fetched { .. } => None,
        })
    }
}

/// Filter one batch by keyword and novelty, marking new ids as seen
/// immediately so a repeated id inside the same batch is reported once.
pub fn select_new(
    source_key: &str,
    batch: Vec<Listing>,
    keywords: &KeywordSet,
    store: &mut SeenStore,
) -> BatchOutcome {
    let fetched = batch.len();
    let mut matched = 0usize;
    let mut new_listings = Vec::new();

    for listing in batch {
        if !keywords.matches(&listing.title) {
            continue;
        }
        matched += 1;
        if !store.is_new(source_key, &listing.id) {
            continue;
        }
        store.mark_seen(source_key, &listing.id);
        new_listings.push(listing);
    }

    BatchOutcome {
        fetched,
        matched,
        new_listings,
    }
}

pub struct Pipeline {
    keywords: KeywordSet,
    sources: Vec<Source>,
    inter_source_delay: Duration,
}

impl Pipeline {
    pub fn new(keywords: KeywordSet, sources: Vec<Source>) -> Self {
        Self {
            keywords,
            sources,
            inter_source_delay: Duration::ZERO,
        }
    }

    pub fn with_inter_source_delay(mut self, delay: Duration) -> Self {
        self.inter_source_delay = delay;
        self
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    pub fn source_labels(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.label.clone()).collect()
    }

    /// Fetch every source in order and diff against `store`.
    /// A failing source is logged and skipped; it never aborts the run.
    pub async fn collect(&self, store: &mut SeenStore) -> RunReport {
        ensure_metrics_described();

        let mut report = RunReport::default();
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 && !self.inter_source_delay.is_zero() {
                tokio::time::sleep(self.inter_source_delay).await;
            }

            let batch = match source.adapter.fetch().await {
                Ok(b) => b,
                Err(e) => {
                    error!(source = %source.key, error = ?e, "source fetch failed, skipping");
                    counter!("source_errors_total", "source" => source.key.clone()).increment(1);
                    report.sources.push((
                        source.key.clone(),
                        SourceOutcome::Failed {
                            error: format!("{e:#}"),
                        },
                    ));
                    continue;
                }
            };

            let mut outcome = select_new(&source.key, batch, &self.keywords, store);
            let new = outcome.new_listings.len();
            info!(
                source = %source.key,
                fetched = outcome.fetched,
                matched = outcome.matched,
                new,
                "source processed"
            );
            counter!("listings_fetched_total", "source" => source.key.clone())
                .increment(outcome.fetched as u64);
            counter!("listings_matched_total", "source" => source.key.clone())
                .increment(outcome.matched as u64);
            counter!("listings_new_total", "source" => source.key.clone()).increment(new as u64);

            report.new_listings.append(&mut outcome.new_listings);
            report.sources.push((
                source.key.clone(),
                SourceOutcome::Fetched {
                    fetched: outcome.fetched,
                    matched: outcome.matched,
                    new,
                },
            ));
        }
        report
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: RunReport,
    pub notified: bool,
    pub notify_error: Option<String>,
}

/// One full run: load store, collect, persist once, then notify.
///
/// A save failure is returned as the run's error and nothing is sent.
/// A notification failure is logged only; seen state stays persisted.
pub async fn run_once(
    pipeline: &Pipeline,
    store_path: &Path,
    notifier: &dyn Notifier,
) -> Result<RunSummary> {
    let mut store = SeenStore::load(store_path);
    let report = pipeline.collect(&mut store).await;

    store
        .save(store_path)
        .with_context(|| format!("persisting seen store to {}", store_path.display()))?;
    gauge!("pipeline_last_run_ts").set(Utc::now().timestamp().max(0) as f64);

    let mut summary = RunSummary {
        report,
        notified: false,
        notify_error: None,
    };

    if summary.report.new_listings.is_empty() {
        info!("no new matching listings, nothing to send");
        return Ok(summary);
    }

    let digest = Digest::new(
        summary.report.new_listings.clone(),
        pipeline.keywords().as_slice().to_vec(),
        pipeline.source_labels(),
        Utc::now(),
    );
    info!(
        total = digest.total(),
        notifier = notifier.name(),
        "sending digest"
    );
    match notifier.send(&digest).await {
        Ok(()) => summary.notified = true,
        Err(e) => {
            error!(notifier = notifier.name(), error = ?e, "notification failed");
            warn!("seen state already saved, these listings will not be re-sent");
            summary.notify_error = Some(format!("{e:#}"));
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l(id: &str, title: &str) -> Listing {
        Listing::new(id, title, format!("https://x.test/{id}"), "siteA")
    }

    #[test]
    fn select_new_filters_marks_and_counts() {
        let mut store = SeenStore::new();
        store.mark_seen("siteA", "1");
        store.mark_seen("siteA", "2");
        let kws = KeywordSet::new(["laundromat"]);

        let out = select_new(
            "siteA",
            vec![l("2", "Laundromat"), l("3", "Coin Laundromat"), l("4", "Bakery")],
            &kws,
            &mut store,
        );
        assert_eq!(out.fetched, 3);
        assert_eq!(out.matched, 2);
        assert_eq!(out.new_listings, vec![l("3", "Coin Laundromat")]);
        let ids: Vec<_> = store.ids("siteA").unwrap().iter().cloned().collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn duplicate_in_batch_reported_once() {
        let mut store = SeenStore::new();
        let kws = KeywordSet::new(["car wash"]);
        let out = select_new(
            "s",
            vec![l("9", "Car Wash"), l("9", "Car Wash (page 2)")],
            &kws,
            &mut store,
        );
        assert_eq!(out.new_listings.len(), 1);
        assert_eq!(store.len("s"), 1);
    }

    #[test]
    fn non_matching_listings_are_not_marked() {
        let mut store = SeenStore::new();
        let out = select_new("s", vec![l("1", "Bakery")], &KeywordSet::new(["coin"]), &mut store);
        assert!(out.new_listings.is_empty());
        assert!(store.is_new("s", "1"));
    }
}
