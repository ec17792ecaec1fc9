// src/ingest/providers/json_api.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use serde_json::Value;

use crate::ingest::http::HttpFetcher;
use crate::ingest::types::{absolutize, dedup_by_id, Listing, SourceAdapter};

/// Field aliases probed in order when reading a listing search API response.
#[derive(Debug, Clone)]
pub struct JsonFieldMap {
    pub items_keys: Vec<String>,
    pub title_keys: Vec<String>,
    pub url_keys: Vec<String>,
    pub id_keys: Vec<String>,
}

impl Default for JsonFieldMap {
    fn default() -> Self {
        fn owned(v: &[&str]) -> Vec<String> {
            v.iter().map(|s| s.to_string()).collect()
        }
        Self {
            items_keys: owned(&["listings", "results", "data"]),
            title_keys: owned(&["businessName", "title", "name", "BusinessName"]),
            url_keys: owned(&["url", "link", "detailUrl", "Url"]),
            id_keys: owned(&["listingId", "id", "ListingId"]),
        }
    }
}

/// Reads listings from a site's internal JSON search endpoint.
pub struct JsonApiAdapter {
    label: String,
    url: String,
    base_url: String,
    fields: JsonFieldMap,
    fetcher: HttpFetcher,
}

impl JsonApiAdapter {
    pub fn new(
        label: impl Into<String>,
        url: impl Into<String>,
        base_url: impl Into<String>,
        fields: JsonFieldMap,
        fetcher: HttpFetcher,
    ) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            base_url: base_url.into(),
            fields,
            fetcher,
        }
    }

    pub fn parse_items_from_str(
        body: &str,
        label: &str,
        base_url: &str,
        fields: &JsonFieldMap,
    ) -> Result<Vec<Listing>> {
        let t0 = std::time::Instant::now();
        let root: Value = serde_json::from_str(body.trim()).context("parsing listing api json")?;

        let items = match &root {
            Value::Array(a) => a.as_slice(),
            Value::Object(map) => fields
                .items_keys
                .iter()
                .filter_map(|k| map.get(k).and_then(Value::as_array))
                .find(|a| !a.is_empty())
                .map(Vec::as_slice)
                .unwrap_or_default(),
            _ => anyhow::bail!("listing api returned neither an object nor an array"),
        };

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let Some(title) = first_string(item, &fields.title_keys) else {
                continue;
            };
            let Some(url) = first_string(item, &fields.url_keys) else {
                continue;
            };
            let url = absolutize(&url, base_url);
            let id = first_string(item, &fields.id_keys).unwrap_or_else(|| url.clone());
            out.push(Listing::new(id, title.trim(), url, label));
        }

        histogram!("listings_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(dedup_by_id(out))
    }
}

fn first_string(item: &Value, keys: &[String]) -> Option<String> {
    keys.iter().find_map(|k| match item.get(k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[async_trait]
impl SourceAdapter for JsonApiAdapter {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let body = self
            .fetcher
            .get_text(&self.url, "application/json, text/plain, */*")
            .await?;
        let items = Self::parse_items_from_str(&body, &self.label, &self.base_url, &self.fields)
            .with_context(|| format!("{} api {}", self.label, self.url))?;
        tracing::info!(source = %self.label, url = %self.url, count = items.len(), "json api fetched");
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.label
    }
}
