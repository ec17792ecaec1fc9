// src/ingest/providers/fixture.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

use crate::ingest::types::{dedup_by_id, Listing, SourceAdapter};

/// Listings read from a JSON file (array of `{id, title, url, source}`).
/// Used for dry runs and tests; `source` falls back to the adapter label.
pub struct FixtureAdapter {
    label: String,
    mode: Mode,
}

enum Mode {
    File(PathBuf),
    Inline(String),
}

#[derive(serde::Deserialize)]
struct FixtureItem {
    id: serde_json::Value,
    title: String,
    url: String,
    #[serde(default)]
    source: Option<String>,
}

impl FixtureAdapter {
    pub fn from_path(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            mode: Mode::File(path.into()),
        }
    }

    pub fn from_fixture_str(label: impl Into<String>, json: &str) -> Self {
        Self {
            label: label.into(),
            mode: Mode::Inline(json.to_string()),
        }
    }

    fn parse(&self, json: &str) -> Result<Vec<Listing>> {
        let items: Vec<FixtureItem> =
            serde_json::from_str(json).context("parsing listing fixture")?;
        let out = items
            .into_iter()
            .map(|it| {
                let id = match it.id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                let source = it.source.unwrap_or_else(|| self.label.clone());
                Listing::new(id, it.title, it.url, source)
            })
            .collect();
        Ok(dedup_by_id(out))
    }
}

#[async_trait]
impl SourceAdapter for FixtureAdapter {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        match &self.mode {
            Mode::File(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading fixture {}", path.display()))?;
                self.parse(&json)
            }
            Mode::Inline(json) => self.parse(json),
        }
    }

    fn name(&self) -> &str {
        &self.label
    }
}
