use std::sync::Arc;

/// Job execution outcome for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Job ran to completion.
    Success,
    /// Job failed.
    Failure,
    /// Job record was removed while the job was running.
    Canceled,
    /// Job exceeded its time limit.
    Timeout,
}

impl JobOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            JobOutcome::Success => "success",
            JobOutcome::Failure => "failure",
            JobOutcome::Canceled => "canceled",
            JobOutcome::Timeout => "timeout",
        }
    }
}

/// Backend metrics collection interface.
///
/// Every method takes the function kind (`detector`, `reid`, ...) as its first label.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a job leaving the queue and starting to run.
    fn record_job_started(&self, function_kind: &str);
    /// Record job completion with outcome and duration.
    ///
    /// # Arguments
    /// - `function_kind`: Kind of the function the job runs
    /// - `outcome`: How the job terminated
    /// - `duration_ms`: Execution time in milliseconds
    fn record_job_completed(&self, function_kind: &str, outcome: JobOutcome, duration_ms: u64);
    /// Record one call to an inference function.
    fn record_invoke(&self, function_kind: &str, ok: bool);
    /// Record an error by its [`crate::CoreError::kind`] label.
    fn record_error(&self, function_kind: &str, error_kind: &str);
    /// Record annotations written to the store in one commit.
    fn record_commit(&self, function_kind: &str, items: usize);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
