// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{dedup_by_id, Listing, SourceAdapter};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Guid>,
}

#[derive(Debug, Deserialize)]
struct Guid {
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// Listing feed published as RSS 2.0 (one `<item>` per listing).
pub struct RssAdapter {
    label: String,
    url: String,
    fetcher: HttpFetcher,
}

impl RssAdapter {
    pub fn new(label: impl Into<String>, url: impl Into<String>, fetcher: HttpFetcher) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            fetcher,
        }
    }

    pub fn parse_items_from_str(xml: &str, label: &str) -> Result<Vec<Listing>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing listing rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = it.title.as_deref().map(str::trim).unwrap_or_default();
            let link = it.link.as_deref().map(str::trim).unwrap_or_default();
            if title.is_empty() || link.is_empty() {
                continue;
            }
            let id = it
                .guid
                .and_then(|g| g.value)
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .unwrap_or_else(|| link.to_string());
            out.push(Listing::new(id, title, link, label));
        }

        histogram!("listings_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(dedup_by_id(out))
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let body = self
            .fetcher
            .get_text(&self.url, "application/rss+xml, application/xml, text/xml")
            .await?;
        let items = Self::parse_items_from_str(&body, &self.label)
            .with_context(|| format!("{} feed {}", self.label, self.url))?;
        tracing::info!(source = %self.label, url = %self.url, count = items.len(), "rss fetched");
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
