use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use lambda_core::config::{PipelineConfig, QueueConfig};
use lambda_gateway::GatewayConfig;
use lambda_observe::LoggerConfig;

/// Names the JSON config file; unset means defaults plus environment.
pub const CONFIG_ENV: &str = "LAMBDA_CONFIG";

/// Agent settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub logger: LoggerConfig,
    pub gateway: GatewayConfig,
    pub queue: QueueConfig,
    pub pipeline: PipelineConfig,
    /// Function to run against the task fixture.
    pub function: Option<String>,
    /// Task fixture, see [`crate::fixture::TaskFixture`].
    pub task_file: Option<PathBuf>,
    /// Where to write the job result; stdout when unset.
    pub output: Option<PathBuf>,
}

impl AgentConfig {
    /// Config file named by `LAMBDA_CONFIG` (if any), then environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.overlay(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("read config {path}"))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {path}"))
    }

    pub fn overlay<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.logger.overlay(&lookup)?;
        self.gateway.overlay(&lookup)?;

        if let Some(v) = lookup("LAMBDA_WORKERS") {
            self.queue.workers = v
                .trim()
                .parse()
                .with_context(|| format!("LAMBDA_WORKERS: {v}"))?;
        }
        if let Some(v) = lookup("LAMBDA_JOB_TIMEOUT_MS") {
            let ms: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("LAMBDA_JOB_TIMEOUT_MS: {v}"))?;
            self.queue.job_timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(v) = lookup("LAMBDA_FUNCTION") {
            self.function = Some(v);
        }
        if let Some(v) = lookup("LAMBDA_TASK_FILE") {
            self.task_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("LAMBDA_OUTPUT") {
            self.output = Some(PathBuf::from(v));
        }
        Ok(())
    }
}
