// tests/pipeline.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use listing_watch::{
    run_once, Digest, KeywordSet, Listing, Notifier, Pipeline, SeenStore, Source,
    SourceAdapter, SourceOutcome,
};
use std::fs;
use std::sync::Mutex;

struct MockAdapter {
    name: &'static str,
    batch: Option<Vec<Listing>>,
}

impl MockAdapter {
    fn ok(name: &'static str, batch: Vec<Listing>) -> Box<dyn SourceAdapter> {
        Box::new(Self {
            name,
            batch: Some(batch),
        })
    }

    fn failing(name: &'static str) -> Box<dyn SourceAdapter> {
        Box::new(Self { name, batch: None })
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        self.batch
            .clone()
            .ok_or_else(|| anyhow!("{} is down", self.name))
    }
    fn name(&self) -> &str {
        self.name
    }
}

#[derive(Default)]
struct RecordingNotifier {
    fail: bool,
    calls: Mutex<Vec<Digest>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, digest: &Digest) -> Result<()> {
        self.calls.lock().unwrap().push(digest.clone());
        if self.fail {
            return Err(anyhow!("smtp refused"));
        }
        Ok(())
    }
    fn name(&self) -> &str {
        "recording"
    }
}

fn listing(id: &str, title: &str, source: &str) -> Listing {
    Listing::new(id, title, format!("https://x.test/{id}"), source)
}

fn site_a_batch() -> Vec<Listing> {
    vec![
        listing("2", "Laundromat", "siteA"),
        listing("3", "Coin Laundromat", "siteA"),
        listing("4", "Bakery", "siteA"),
    ]
}

#[tokio::test]
async fn reference_scenario_reports_only_the_unseen_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    fs::write(&path, r#"{"siteA": ["1", "2"]}"#).unwrap();

    let pipeline = Pipeline::new(
        KeywordSet::new(["laundromat"]),
        vec![Source::new("siteA", "siteA", MockAdapter::ok("siteA", site_a_batch()))],
    );
    let notifier = RecordingNotifier::default();
    let summary = run_once(&pipeline, &path, &notifier).await.unwrap();

    let ids: Vec<_> = summary.report.new_listings.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, ["3"]);
    assert!(summary.notified);

    let stored = SeenStore::load(&path);
    let site_a: Vec<_> = stored.ids("siteA").unwrap().iter().cloned().collect();
    assert_eq!(site_a, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn second_run_with_same_batch_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let pipeline = Pipeline::new(
        KeywordSet::new(["laundromat"]),
        vec![Source::new("siteA", "siteA", MockAdapter::ok("siteA", site_a_batch()))],
    );
    let notifier = RecordingNotifier::default();

    let first = run_once(&pipeline, &path, &notifier).await.unwrap();
    assert_eq!(first.report.new_listings.len(), 2);

    let second = run_once(&pipeline, &path, &notifier).await.unwrap();
    assert!(second.report.new_listings.is_empty());
    assert!(!second.notified);
    assert_eq!(notifier.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_source_is_skipped_and_others_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let pipeline = Pipeline::new(
        KeywordSet::new(["coin"]),
        vec![
            Source::new("down", "Down", MockAdapter::failing("down")),
            Source::new(
                "up",
                "Up",
                MockAdapter::ok(
                    "up",
                    vec![listing("7", "Coin Wash", "Up"), listing("8", "Deli", "Up")],
                ),
            ),
        ],
    );
    let notifier = RecordingNotifier::default();
    let summary = run_once(&pipeline, &path, &notifier).await.unwrap();

    assert_eq!(summary.report.new_listings.len(), 1);
    assert_eq!(summary.report.new_listings[0].id, "7");
    assert_eq!(summary.report.failed_sources().collect::<Vec<_>>(), ["down"]);
    assert!(matches!(
        summary.report.sources[1].1,
        SourceOutcome::Fetched { fetched: 2, matched: 1, new: 1 }
    ));

    let stored = SeenStore::load(&path);
    assert!(!stored.is_new("up", "7"));
    assert_eq!(stored.len("down"), 0);
}

#[tokio::test]
async fn duplicate_within_batch_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let batch = vec![
        listing("5", "Car Wash", "S"),
        listing("5", "Car Wash", "S"),
    ];
    let pipeline = Pipeline::new(
        KeywordSet::new(["car wash"]),
        vec![Source::new("s", "S", MockAdapter::ok("s", batch))],
    );
    let notifier = RecordingNotifier::default();
    let summary = run_once(&pipeline, &path, &notifier).await.unwrap();
    assert_eq!(summary.report.new_listings.len(), 1);
    assert_eq!(SeenStore::load(&path).len("s"), 1);
}

#[tokio::test]
async fn empty_keywords_never_notify() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let pipeline = Pipeline::new(
        KeywordSet::empty(),
        vec![Source::new("siteA", "siteA", MockAdapter::ok("siteA", site_a_batch()))],
    );
    let notifier = RecordingNotifier::default();
    let summary = run_once(&pipeline, &path, &notifier).await.unwrap();
    assert!(summary.report.new_listings.is_empty());
    assert!(notifier.calls.lock().unwrap().is_empty());
    // Store is still written, just empty.
    assert!(path.exists());
}

#[tokio::test]
async fn save_failure_is_terminal_and_skips_notification() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "file").unwrap();
    let path = blocker.join("seen.json");

    let pipeline = Pipeline::new(
        KeywordSet::new(["laundromat"]),
        vec![Source::new("siteA", "siteA", MockAdapter::ok("siteA", site_a_batch()))],
    );
    let notifier = RecordingNotifier::default();
    let res = run_once(&pipeline, &path, &notifier).await;
    assert!(res.is_err());
    assert!(notifier.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn notification_failure_keeps_seen_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let pipeline = Pipeline::new(
        KeywordSet::new(["laundromat"]),
        vec![Source::new("siteA", "siteA", MockAdapter::ok("siteA", site_a_batch()))],
    );
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let summary = run_once(&pipeline, &path, &notifier).await.unwrap();
    assert!(!summary.notified);
    assert!(summary.notify_error.as_deref().unwrap().contains("smtp refused"));
    assert!(!SeenStore::load(&path).is_new("siteA", "3"));
}

#[tokio::test]
async fn digest_groups_by_display_source_in_source_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seen.json");
    let pipeline = Pipeline::new(
        KeywordSet::new(["laundry"]),
        vec![
            Source::new(
                "bizmls",
                "BizMLS",
                MockAdapter::ok(
                    "bizmls",
                    vec![
                        listing("1", "Laundry A", "BizMLS (Broward)"),
                        listing("2", "Laundry B", "BizMLS (Palm Beach)"),
                        listing("3", "Laundry C", "BizMLS (Broward)"),
                    ],
                ),
            ),
            Source::new(
                "bizbuysell",
                "BizBuySell",
                MockAdapter::ok("bizbuysell", vec![listing("1", "Laundry D", "BizBuySell")]),
            ),
        ],
    );
    let notifier = RecordingNotifier::default();
    run_once(&pipeline, &path, &notifier).await.unwrap();

    let calls = notifier.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let groups: Vec<_> = calls[0]
        .groups
        .iter()
        .map(|(s, v)| (s.as_str(), v.len()))
        .collect();
    assert_eq!(
        groups,
        [
            ("BizMLS (Broward)", 2),
            ("BizMLS (Palm Beach)", 1),
            ("BizBuySell", 1)
        ]
    );
    assert_eq!(calls[0].keywords, ["laundry"]);
    assert_eq!(calls[0].sources, ["BizMLS", "BizBuySell"]);
}
