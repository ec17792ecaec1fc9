// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod ingest;
pub mod keywords;
pub mod metrics;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::ingest::seen::SeenStore;
pub use crate::ingest::types::{Listing, SourceAdapter};
pub use crate::ingest::{run_once, Pipeline, RunReport, RunSummary, Source, SourceOutcome};
pub use crate::keywords::KeywordSet;
pub use crate::notify::{Digest, Notifier};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "info,listing_watch=info,reqwest=warn,hyper=warn";

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}
