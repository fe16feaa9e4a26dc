use serde::{Deserialize, Serialize};

use lambda_model::DEFAULT_FLUSH_EVERY;

/// Local job queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Jobs running at the same time.
    pub workers: usize,
    /// Hard limit per job; `None` disables it.
    pub job_timeout_ms: Option<u64>,
    /// How long finished and failed records stay queryable.
    pub result_ttl_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            job_timeout_ms: None,
            result_ttl_ms: 500_000,
        }
    }
}

/// Detection pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Commit cadence in processed frames.
    pub flush_every: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }
}
