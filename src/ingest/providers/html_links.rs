// src/ingest/providers/html_links.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{absolutize, dedup_by_id, Listing, SourceAdapter};

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Which anchors count as listings and how to read an id out of them.
#[derive(Debug, Clone)]
pub struct LinkRules {
    /// Lowercase fragments; an href must contain at least one.
    pub href_contains: Vec<String>,
    /// Exactly one capture group; the capture becomes the listing id.
    pub id_pattern: Option<Regex>,
    pub min_title_len: usize,
    /// Lowercase navigation labels to ignore ("home", "login", ...).
    pub skip_titles: Vec<String>,
}

impl Default for LinkRules {
    fn default() -> Self {
        Self {
            href_contains: Vec::new(),
            id_pattern: None,
            min_title_len: 3,
            skip_titles: Vec::new(),
        }
    }
}

/// Scans a results page for anchors pointing at listing detail pages.
pub struct HtmlLinksAdapter {
    label: String,
    url: String,
    base_url: String,
    rules: LinkRules,
    fetcher: HttpFetcher,
}

impl HtmlLinksAdapter {
    pub fn new(
        label: impl Into<String>,
        url: impl Into<String>,
        base_url: impl Into<String>,
        rules: LinkRules,
        fetcher: HttpFetcher,
    ) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            base_url: base_url.into(),
            rules,
            fetcher,
        }
    }

    pub fn parse_links_from_str(
        html: &str,
        label: &str,
        base_url: &str,
        rules: &LinkRules,
    ) -> Vec<Listing> {
        let t0 = std::time::Instant::now();
        let doc = Html::parse_document(html);

        let mut out = Vec::new();
        for a in doc.select(&ANCHOR) {
            let Some(href) = a.value().attr("href").map(str::trim) else {
                continue;
            };
            let href_lower = href.to_lowercase();
            if !rules
                .href_contains
                .iter()
                .any(|p| href_lower.contains(p.as_str()))
            {
                continue;
            }

            let title = collapse_ws(&a.text().collect::<String>());
            if title.chars().count() < rules.min_title_len
                || rules.skip_titles.contains(&title.to_lowercase())
            {
                continue;
            }

            let id = rules
                .id_pattern
                .as_ref()
                .and_then(|re| re.captures(href))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| href.to_string());

            out.push(Listing::new(id, title, absolutize(href, base_url), label));
        }

        histogram!("listings_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        dedup_by_id(out)
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl SourceAdapter for HtmlLinksAdapter {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let html = self
            .fetcher
            .get_text(&self.url, "text/html,application/xhtml+xml")
            .await
            .with_context(|| format!("{} page {}", self.label, self.url))?;
        let items = Self::parse_links_from_str(&html, &self.label, &self.base_url, &self.rules);
        tracing::info!(source = %self.label, url = %self.url, count = items.len(), "html links scanned");
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> LinkRules {
        LinkRules {
            href_contains: vec!["listno=".into(), "a-bus3".into()],
            id_pattern: Some(Regex::new(r"(?i)listno=(\w+)").unwrap()),
            min_title_len: 3,
            skip_titles: vec!["home".into(), "search".into()],
        }
    }

    #[test]
    fn picks_listing_anchors_and_extracts_ids() {
        let html = r#"<html><body>
            <a href="/">Home</a>
            <a href="a-bus3.asp?LISTNO=B100">  Coin
                Laundromat </a>
            <a href="a-bus3.asp?listno=B101">Search</a>
            <a href="a-bus3.asp?listno=B102">ok</a>
            <a href="https://other.test/a-bus3.asp">Dry Cleaner</a>
            <a href="a-bus3.asp?listno=B100">Coin Laundromat (dup)</a>
        </body></html>"#;
        let out = HtmlLinksAdapter::parse_links_from_str(
            html,
            "BizMLS (Broward)",
            "https://bizmls.test/cgi-bin",
            &rules(),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "B100");
        assert_eq!(out[0].title, "Coin Laundromat");
        assert_eq!(out[0].url, "https://bizmls.test/cgi-bin/a-bus3.asp?LISTNO=B100");
        assert_eq!(out[1].id, "https://other.test/a-bus3.asp");
        assert_eq!(out[1].source, "BizMLS (Broward)");
    }
}
