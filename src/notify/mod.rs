// src/notify/mod.rs
pub mod email;
pub mod render;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::ingest::types::Listing;

/// New listings of one run, grouped by display source in first-appearance order.
#[derive(Debug, Clone)]
pub struct Digest {
    pub groups: Vec<(String, Vec<Listing>)>,
    pub keywords: Vec<String>,
    pub sources: Vec<String>,
    pub ts: DateTime<Utc>,
}

impl Digest {
    pub fn new(
        listings: Vec<Listing>,
        keywords: Vec<String>,
        sources: Vec<String>,
        ts: DateTime<Utc>,
    ) -> Self {
        let mut groups: Vec<(String, Vec<Listing>)> = Vec::new();
        for l in listings {
            match groups.iter_mut().find(|(s, _)| *s == l.source) {
                Some((_, items)) => items.push(l),
                None => groups.push((l.source.clone(), vec![l])),
            }
        }
        Self {
            groups,
            keywords,
            sources,
            ts,
        }
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, v)| v.len()).sum()
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, digest: &Digest) -> Result<()>;
    fn name(&self) -> &str;
}

/// Writes the digest to the log; used when SMTP is not configured.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, digest: &Digest) -> Result<()> {
        tracing::info!(subject = %render::subject(digest), "digest (email disabled)");
        for (source, items) in &digest.groups {
            for l in items {
                tracing::info!(source = %source, id = %l.id, title = %l.title, url = %l.url, "new listing");
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Pick the email notifier when SMTP settings are complete, otherwise the log.
pub fn from_config(cfg: &crate::config::AppConfig) -> Result<Box<dyn Notifier>> {
    match &cfg.smtp {
        Some(smtp) => Ok(Box::new(email::EmailSender::new(smtp)?)),
        None => {
            tracing::warn!("SMTP not configured (SMTP_USER/SMTP_PASS/NOTIFY_EMAIL_TO), digests go to the log only");
            Ok(Box::new(LogNotifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_source_in_first_appearance_order() {
        let d = Digest::new(
            vec![
                Listing::new("1", "a", "u", "BizMLS (Broward)"),
                Listing::new("2", "b", "u", "BizBuySell"),
                Listing::new("3", "c", "u", "BizMLS (Broward)"),
            ],
            vec![],
            vec![],
            Utc::now(),
        );
        let names: Vec<_> = d.groups.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, ["BizMLS (Broward)", "BizBuySell"]);
        assert_eq!(d.groups[0].1.len(), 2);
        assert_eq!(d.total(), 3);
    }
}
