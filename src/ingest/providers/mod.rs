// src/ingest/providers/mod.rs
pub mod chain;
pub mod fixture;
pub mod html_links;
pub mod json_api;
pub mod rss;

pub use chain::{ConcatAdapter, FallbackAdapter};
pub use fixture::FixtureAdapter;
pub use html_links::{HtmlLinksAdapter, LinkRules};
pub use json_api::{JsonApiAdapter, JsonFieldMap};
pub use rss::RssAdapter;
