// src/ingest/seen.rs
//! Persisted record of listing ids that already triggered a notification.
//!
//! On disk this is a JSON object of arrays: `{"bizmls": ["123", "456"]}`.
//! The store only grows. Ids are opaque strings compared byte for byte.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const DEFAULT_SEEN_PATH: &str = "seen_listings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenStore {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl SeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the persisted store. A missing, unreadable or malformed file
    /// yields an empty store; this is logged but never fatal.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no seen store yet, starting empty");
                return Self::new();
            }
            Err(e) => {
                error!(path = %path.display(), error = ?e,
                    "could not read seen store, every listing will look new");
                return Self::new();
            }
        };
        match Self::from_json(&raw) {
            Ok(store) => {
                info!(
                    path = %path.display(),
                    sources = store.entries.len(),
                    ids = store.total(),
                    "seen store loaded"
                );
                store
            }
            Err(e) => {
                error!(path = %path.display(), error = ?e,
                    "seen store is malformed, every listing will look new");
                Self::new()
            }
        }
    }

    /// Parse the object-of-arrays shape. Entries that are not arrays are
    /// dropped; non-string ids inside an array are skipped.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("parsing seen store json")?;
        let Value::Object(map) = value else {
            anyhow::bail!("seen store root is not a JSON object");
        };

        let mut entries = BTreeMap::new();
        for (key, v) in map {
            match v {
                Value::Array(items) => {
                    let ids: BTreeSet<String> = items
                        .into_iter()
                        .filter_map(|it| match it {
                            Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect();
                    entries.insert(key, ids);
                }
                other => {
                    warn!(source = %key, value = %other, "dropping non-array seen entry");
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.entries).context("serializing seen store")
    }

    /// Overwrite the persisted copy atomically: write a sibling temp file,
    /// fsync it, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating directory {}", dir.display()))?;
        }

        let body = self.to_json()?;
        let tmp = temp_path(path);
        {
            let mut f = fs::File::create(&tmp)
                .with_context(|| format!("creating {}", tmp.display()))?;
            f.write_all(body.as_bytes())
                .with_context(|| format!("writing {}", tmp.display()))?;
            f.sync_all()
                .with_context(|| format!("syncing {}", tmp.display()))?;
        }
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e)
                .with_context(|| format!("replacing {} with {}", path.display(), tmp.display()));
        }

        info!(path = %path.display(), ids = self.total(), "seen store saved");
        Ok(())
    }

    pub fn is_new(&self, source_key: &str, id: &str) -> bool {
        self.entries
            .get(source_key)
            .map_or(true, |ids| !ids.contains(id))
    }

    /// Idempotent. Returns true when the id was not present before.
    pub fn mark_seen(&mut self, source_key: &str, id: &str) -> bool {
        self.entries
            .entry(source_key.to_string())
            .or_default()
            .insert(id.to_string())
    }

    pub fn len(&self, source_key: &str) -> usize {
        self.entries.get(source_key).map_or(0, BTreeSet::len)
    }

    pub fn total(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn source_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn ids(&self, source_key: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(source_key)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_SEEN_PATH.into());
    name.push(format!(".tmp-{}", std::process::id()));
    path.with_file_name(name)
}
