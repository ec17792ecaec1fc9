// src/ingest/http.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub retry_attempts: u8,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(6),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Shared GET client for the listing adapters: per-request timeout,
/// fixed retry count and delay, non-2xx treated as failure.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    settings: HttpSettings,
}

impl HttpFetcher {
    pub fn new(settings: HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client, settings })
    }

    pub async fn get_text(&self, url: &str, accept: &str) -> Result<String> {
        let attempts = self.settings.retry_attempts.max(1);
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, accept)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status() {
                    Ok(ok) => match ok.text().await {
                        Ok(body) => return Ok(body),
                        Err(e) => anyhow!("reading body: {e}"),
                    },
                    Err(e) => anyhow!("http status: {e}"),
                },
                Err(e) => anyhow!("request failed: {e}"),
            };

            tracing::warn!(url, attempt, attempts, error = %err, "fetch attempt failed");
            if attempt >= attempts {
                return Err(err.context(format!("all {attempts} attempts failed for {url}")));
            }
            tokio::time::sleep(self.settings.retry_delay).await;
        }
    }
}
