// src/keywords.rs
//! Keyword list loading and title matching.
//!
//! Matching is a plain case-insensitive substring test, so "wash" also
//! hits "carwashing" while "car wash" does not. An empty keyword set matches nothing.

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ENV_KEYWORDS_PATH: &str = "LISTINGS_KEYWORDS_PATH";

const FALLBACK_PATHS: [&str; 3] = [
    "keywords.json",
    "config/keywords.toml",
    "config/keywords.json",
];

/// True iff the lowercased `title` contains at least one keyword.
/// `keywords` are expected to be lowercased and trimmed already.
pub fn matches<S: AsRef<str>>(title: &str, keywords: &[S]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let lower = title.to_lowercase();
    keywords.iter().any(|kw| lower.contains(kw.as_ref()))
}

/// Ordered, normalized keyword list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    items: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            items: clean_list(items),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn matches(&self, title: &str) -> bool {
        matches(title, &self.items)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Load from an explicit path. Supports a JSON array or TOML `keywords = [...]`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading keywords from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_keywords(&content, ext.as_str())
            .with_context(|| format!("parsing keywords in {}", path.display()))
    }

    /// Resolve the keyword file using env var + fallbacks:
    /// 1) $LISTINGS_KEYWORDS_PATH
    /// 2) keywords.json
    /// 3) config/keywords.toml
    /// 4) config/keywords.json
    ///
    /// No file at all yields an empty set.
    pub fn load_default() -> Result<Self> {
        match resolve_default_path()? {
            Some(p) => Self::load_from(&p),
            None => Ok(Self::empty()),
        }
    }

    /// Like [`KeywordSet::load_default`] but never fails.
    pub fn load_or_empty() -> Self {
        match Self::load_default() {
            Ok(set) if set.is_empty() => {
                error!("keyword list is empty, no listings will match");
                set
            }
            Ok(set) => {
                info!(count = set.len(), keywords = ?set.items, "keywords loaded");
                set
            }
            Err(e) => {
                error!(error = ?e, "could not load keywords, no keywords active");
                Self::empty()
            }
        }
    }
}

fn resolve_default_path() -> Result<Option<PathBuf>> {
    if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(Some(pb));
        }
        return Err(anyhow!("{ENV_KEYWORDS_PATH} points to non-existent path"));
    }
    Ok(FALLBACK_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists()))
}

fn parse_keywords(s: &str, hint_ext: &str) -> Result<KeywordSet> {
    let try_toml = hint_ext == "toml" || s.contains("keywords");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported keyword format"))
}

fn parse_toml(s: &str) -> Result<KeywordSet> {
    #[derive(serde::Deserialize)]
    struct TomlKw {
        keywords: Vec<String>,
    }
    let v: TomlKw = toml::from_str(s)?;
    Ok(KeywordSet::new(v.keywords))
}

fn parse_json(s: &str) -> Result<KeywordSet> {
    let v: Vec<serde_json::Value> = serde_json::from_str(s)?;
    // Non-string scalars are kept in their display form ("123" for 123).
    let items = v.into_iter().filter_map(|it| match it {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    });
    Ok(KeywordSet::new(items))
}

fn clean_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for it in items {
        let t = it.as_ref().trim().to_lowercase();
        if !t.is_empty() && seen.insert(t.clone()) {
            out.push(t);
        }
    }
    out
}
