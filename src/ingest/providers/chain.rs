// src/ingest/providers/chain.rs
//! Combinators over several fetch strategies for one source.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::ingest::types::{dedup_by_id, Listing, SourceAdapter};

/// Tries strategies in priority order; the first non-empty batch wins.
/// An all-empty run is `Ok(vec![])`; it is an error only if every strategy failed.
pub struct FallbackAdapter {
    name: String,
    strategies: Vec<Box<dyn SourceAdapter>>,
}

impl FallbackAdapter {
    pub fn new(name: impl Into<String>, strategies: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self {
            name: name.into(),
            strategies,
        }
    }
}

#[async_trait]
impl SourceAdapter for FallbackAdapter {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let mut failures = Vec::new();
        for s in &self.strategies {
            match s.fetch().await {
                Ok(v) if !v.is_empty() => return Ok(v),
                Ok(_) => {
                    tracing::info!(source = %self.name, strategy = s.name(), "strategy returned nothing, trying next");
                }
                Err(e) => {
                    tracing::warn!(source = %self.name, strategy = s.name(), error = ?e, "strategy failed, trying next");
                    failures.push(format!("{}: {e:#}", s.name()));
                }
            }
        }
        if !self.strategies.is_empty() && failures.len() == self.strategies.len() {
            return Err(anyhow!("all strategies failed: {}", failures.join("; ")));
        }
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Runs every strategy and concatenates the batches (e.g. one per region).
/// Failing strategies are skipped; it is an error only if all of them fail.
pub struct ConcatAdapter {
    name: String,
    parts: Vec<Box<dyn SourceAdapter>>,
}

impl ConcatAdapter {
    pub fn new(name: impl Into<String>, parts: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self {
            name: name.into(),
            parts,
        }
    }
}

#[async_trait]
impl SourceAdapter for ConcatAdapter {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let mut out = Vec::new();
        let mut failures = Vec::new();
        for p in &self.parts {
            match p.fetch().await {
                Ok(mut v) => out.append(&mut v),
                Err(e) => {
                    tracing::warn!(source = %self.name, part = p.name(), error = ?e, "part failed, skipping");
                    failures.push(format!("{}: {e:#}", p.name()));
                }
            }
        }
        if !self.parts.is_empty() && failures.len() == self.parts.len() {
            return Err(anyhow!("all parts failed: {}", failures.join("; ")));
        }
        Ok(dedup_by_id(out))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
