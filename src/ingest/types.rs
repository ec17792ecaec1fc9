// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One business-for-sale record as produced by a source adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    pub id: String,     // opaque, unique only within one source key
    pub title: String,  // free text, matched against keywords
    pub url: String,    // detail page
    pub source: String, // display label, e.g. "BizMLS (Broward)"
}

impl Listing {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            source: source.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Listing>>;
    fn name(&self) -> &str;
}

/// Drop repeated ids inside a single batch, keeping the first occurrence.
pub fn dedup_by_id(listings: Vec<Listing>) -> Vec<Listing> {
    let mut ids: HashSet<String> = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|l| ids.insert(l.id.clone()))
        .collect()
}

/// Join a possibly relative href onto `base`.
pub fn absolutize(href: &str, base: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{}", href.trim_start_matches("./"))
    }
}
