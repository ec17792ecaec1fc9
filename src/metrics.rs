// src/metrics.rs
use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::{Path, PathBuf};

/// Prometheus recorder whose exposition is written to a file once per run,
/// for a node-exporter textfile collector to pick up.
pub struct Metrics {
    pub handle: PrometheusHandle,
    path: PathBuf,
}

impl Metrics {
    /// Install the global recorder. Call once, before the pipeline runs.
    pub fn init(path: &Path) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self {
            handle,
            path: path.to_path_buf(),
        })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write via temp file + rename so the collector never reads a partial file.
    pub fn write_textfile(&self) -> Result<()> {
        let tmp = self.path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render())
            .with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
