// src/config/mod.rs
pub mod app;
pub mod sources;

pub use app::{AppConfig, SmtpConfig};
pub use sources::{CombineMode, SourceConfig, SourcesConfig, StrategyConfig, StrategyKind};
