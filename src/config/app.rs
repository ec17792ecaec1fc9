// src/config/app.rs
use std::path::PathBuf;
use std::time::Duration;

use crate::ingest::http::{HttpSettings, DEFAULT_USER_AGENT};
use crate::ingest::seen::DEFAULT_SEEN_PATH;

pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Process configuration. Everything comes from the environment
/// (after `.env` is loaded); missing or unparseable values use defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub seen_path: PathBuf,
    pub sources_path: PathBuf,
    pub inter_source_delay: Duration,
    pub http: HttpSettings,
    pub metrics_textfile: Option<PathBuf>,
    /// `None` when user, password or recipients are missing.
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; lets tests avoid touching process env.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |k: &str, default: u64| {
            non_empty(k)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(default))
        };

        let http = HttpSettings {
            timeout: secs("HTTP_TIMEOUT_SECS", 20),
            retry_attempts: non_empty("HTTP_RETRY_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            retry_delay: secs("HTTP_RETRY_DELAY_SECS", 6),
            user_agent: non_empty("HTTP_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        let smtp = match (
            non_empty("SMTP_USER"),
            non_empty("SMTP_PASS"),
            non_empty("NOTIFY_EMAIL_TO"),
        ) {
            (Some(user), Some(pass), Some(to)) => Some(SmtpConfig {
                host: non_empty("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port: non_empty("SMTP_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(587),
                from: non_empty("NOTIFY_EMAIL_FROM").unwrap_or_else(|| user.clone()),
                to: to
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
                user,
                pass,
            }),
            _ => None,
        };

        Self {
            seen_path: non_empty("LISTINGS_SEEN_PATH")
                .unwrap_or_else(|| DEFAULT_SEEN_PATH.to_string())
                .into(),
            sources_path: non_empty("LISTINGS_SOURCES_PATH")
                .unwrap_or_else(|| DEFAULT_SOURCES_PATH.to_string())
                .into(),
            inter_source_delay: secs("INTER_SOURCE_DELAY_SECS", 4),
            http,
            metrics_textfile: non_empty("METRICS_TEXTFILE_PATH").map(PathBuf::from),
            smtp,
        }
    }
}
