use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{Result, RumError};
use crate::extract::extract_records;
use crate::render::Renderer;
use crate::report::build_report;
use crate::types::{Config, Monitor, ReportPolicy, RunSummary, Severity};

/// Where monitor data comes from.
#[async_trait]
pub trait RumSource {
    async fn fetch(&self, monitor: &Monitor, token: &str) -> Result<Value>;
}

/// Where rendered messages go.
#[async_trait]
pub trait ChatSink {
    async fn deliver(&self, text: &str) -> Result<()>;
}

/// Runs fetch → extract → report → render → deliver for each monitor in turn.
pub struct MonitorPipeline<'a, S, C> {
    source: &'a S,
    sink: &'a C,
    policy: ReportPolicy,
    renderer: Renderer,
    debug_dir: Option<PathBuf>,
}

impl<'a, S: RumSource + Sync, C: ChatSink + Sync> MonitorPipeline<'a, S, C> {
    pub fn new(source: &'a S, sink: &'a C, policy: ReportPolicy, renderer: Renderer) -> Self {
        Self {
            source,
            sink,
            policy,
            renderer,
            debug_dir: None,
        }
    }

    pub fn from_config(source: &'a S, sink: &'a C, cfg: &Config) -> Self {
        Self::new(source, sink, cfg.policy, Renderer::new(cfg.dialect, cfg.max_block_chars))
            .with_debug_dir(cfg.debug_dir.clone())
    }

    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    /// Process every monitor in order. A failing monitor gets one error notice
    /// and never stops the rest of the run.
    pub async fn run(&self, monitors: &[Monitor], token: &str) -> RunSummary {
        let mut summary = RunSummary::default();
        for monitor in monitors {
            info!("Processing monitor {} ({})", monitor.label, monitor.id);
            match self.process_monitor(monitor, token).await {
                Ok(blocks) => {
                    summary.blocks_delivered += blocks;
                    summary.reported.push(monitor.label.clone());
                }
                Err(e) => {
                    warn!("Monitor {} failed: {}", monitor.label, e);
                    self.notify_failure(monitor, &e).await;
                    summary.failed.push(monitor.label.clone());
                }
            }
        }
        summary
    }

    /// Returns the number of blocks delivered.
    pub async fn process_monitor(&self, monitor: &Monitor, token: &str) -> Result<usize> {
        let response = self.source.fetch(monitor, token).await?;
        if let Some(dir) = &self.debug_dir {
            if let Err(e) = write_debug_artifact(dir, &monitor.label, &response) {
                warn!("Could not write debug artifact for {}: {}", monitor.label, e);
            }
        }

        let records = extract_records(&response);
        let report = build_report(&monitor.label, &records, &self.policy);
        info!(
            "Monitor {}: {} record(s), {} row(s), {} critical, {} warn",
            monitor.label,
            records.len(),
            report.data_rows().count(),
            report.count_by_severity(Severity::Critical),
            report.count_by_severity(Severity::Warn)
        );

        let blocks = self.renderer.render_blocks(&report);
        for block in &blocks {
            self.sink.deliver(&block.text).await?;
        }
        Ok(blocks.len())
    }

    async fn notify_failure(&self, monitor: &Monitor, err: &RumError) {
        let notice = self.renderer.render_error(&monitor.label, &err.to_string());
        if let Err(e) = self.sink.deliver(&notice).await {
            error!("Could not deliver error notice for {}: {}", monitor.label, e);
        }
    }
}

/// Dump the raw response for offline inspection.
pub fn write_debug_artifact(dir: &Path, label: &str, response: &Value) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let safe: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let path = dir.join(format!("rum_{}.json", safe));
    let body = serde_json::to_vec_pretty(response).map_err(std::io::Error::from)?;
    std::fs::write(&path, body)?;
    Ok(path)
}
