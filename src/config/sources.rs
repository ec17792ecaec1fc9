// src/config/sources.rs
//! Which sites to watch and how to fetch each one.
//!
//! ```toml
//! [[source]]
//! key = "bizbuysell"
//! label = "BizBuySell"
//!
//! [[source.strategy]]
//! kind = "json_api"
//! url = "https://www.bizbuysell.com/bbs-search/listings/search?st=FL"
//! base_url = "https://www.bizbuysell.com"
//!
//! [[source.strategy]]
//! kind = "html_links"
//! url = "https://www.bizbuysell.com/florida-businesses-for-sale/"
//! base_url = "https://www.bizbuysell.com"
//! href_contains = ["business-for-sale"]
//! ```

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::http::HttpFetcher;
use crate::ingest::providers::{
    ConcatAdapter, FallbackAdapter, FixtureAdapter, HtmlLinksAdapter, JsonApiAdapter,
    JsonFieldMap, LinkRules, RssAdapter,
};
use crate::ingest::types::SourceAdapter;
use crate::ingest::Source;

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    #[serde(rename = "source", alias = "sources", default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    /// First strategy with a non-empty batch wins.
    #[default]
    Fallback,
    /// Every strategy contributes (e.g. one strategy per county).
    Concat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Seen-store key. Changing it makes every listing of the source look new.
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub mode: CombineMode,
    #[serde(rename = "strategy", alias = "strategies", default)]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    /// Overrides the source label on listings from this strategy.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: StrategyKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    JsonApi {
        url: String,
        #[serde(default)]
        base_url: String,
        #[serde(default)]
        items_keys: Option<Vec<String>>,
        #[serde(default)]
        title_keys: Option<Vec<String>>,
        #[serde(default)]
        url_keys: Option<Vec<String>>,
        #[serde(default)]
        id_keys: Option<Vec<String>>,
    },
    Rss {
        url: String,
    },
    HtmlLinks {
        url: String,
        #[serde(default)]
        base_url: String,
        href_contains: Vec<String>,
        #[serde(default)]
        id_pattern: Option<String>,
        #[serde(default)]
        min_title_len: Option<usize>,
        #[serde(default)]
        skip_titles: Vec<String>,
    },
    Fixture {
        path: PathBuf,
    },
}

impl SourcesConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading sources from {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let cfg: SourcesConfig = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("no sources configured");
        }
        let mut keys = HashSet::new();
        for s in &self.sources {
            if s.key.trim().is_empty() {
                bail!("source with label {:?} has an empty key", s.label);
            }
            if !keys.insert(s.key.as_str()) {
                bail!("duplicate source key {:?}", s.key);
            }
            if s.strategies.is_empty() {
                bail!("source {:?} has no strategies", s.key);
            }
            for st in &s.strategies {
                if let StrategyKind::HtmlLinks { id_pattern: Some(p), .. } = &st.kind {
                    compile_id_pattern(p).with_context(|| format!("source {:?}", s.key))?;
                }
            }
        }
        Ok(())
    }

    /// Turn the configuration into pipeline sources, in file order.
    pub fn build(&self, fetcher: &HttpFetcher) -> Result<Vec<Source>> {
        self.sources
            .iter()
            .map(|s| {
                let mut parts = s
                    .strategies
                    .iter()
                    .map(|st| build_strategy(st, &s.label, fetcher))
                    .collect::<Result<Vec<_>>>()?;
                let adapter: Box<dyn SourceAdapter> = if parts.len() == 1 {
                    parts.remove(0)
                } else {
                    match s.mode {
                        CombineMode::Fallback => Box::new(FallbackAdapter::new(&s.label, parts)),
                        CombineMode::Concat => Box::new(ConcatAdapter::new(&s.label, parts)),
                    }
                };
                Ok(Source::new(&s.key, &s.label, adapter))
            })
            .collect()
    }
}

fn compile_id_pattern(p: &str) -> Result<Regex> {
    let re = Regex::new(p).with_context(|| format!("invalid id_pattern {p:?}"))?;
    if re.captures_len() != 2 {
        return Err(anyhow!(
            "id_pattern {p:?} must have exactly one capture group"
        ));
    }
    Ok(re)
}

fn build_strategy(
    st: &StrategyConfig,
    source_label: &str,
    fetcher: &HttpFetcher,
) -> Result<Box<dyn SourceAdapter>> {
    let label = st.label.as_deref().unwrap_or(source_label);
    let adapter: Box<dyn SourceAdapter> = match &st.kind {
        StrategyKind::JsonApi {
            url,
            base_url,
            items_keys,
            title_keys,
            url_keys,
            id_keys,
        } => {
            let d = JsonFieldMap::default();
            let fields = JsonFieldMap {
                items_keys: items_keys.clone().unwrap_or(d.items_keys),
                title_keys: title_keys.clone().unwrap_or(d.title_keys),
                url_keys: url_keys.clone().unwrap_or(d.url_keys),
                id_keys: id_keys.clone().unwrap_or(d.id_keys),
            };
            Box::new(JsonApiAdapter::new(
                label,
                url,
                base_url,
                fields,
                fetcher.clone(),
            ))
        }
        StrategyKind::Rss { url } => Box::new(RssAdapter::new(label, url, fetcher.clone())),
        StrategyKind::HtmlLinks {
            url,
            base_url,
            href_contains,
            id_pattern,
            min_title_len,
            skip_titles,
        } => {
            let rules = LinkRules {
                href_contains: href_contains.iter().map(|s| s.to_lowercase()).collect(),
                id_pattern: id_pattern.as_deref().map(compile_id_pattern).transpose()?,
                min_title_len: min_title_len.unwrap_or(LinkRules::default().min_title_len),
                skip_titles: skip_titles.iter().map(|s| s.to_lowercase()).collect(),
            };
            Box::new(HtmlLinksAdapter::new(
                label,
                url,
                base_url,
                rules,
                fetcher.clone(),
            ))
        }
        StrategyKind::Fixture { path } => Box::new(FixtureAdapter::from_path(label, path)),
    };
    Ok(adapter)
}
