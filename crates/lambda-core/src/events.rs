//! Job lifecycle events and their subscribers.
use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use tracing::error;

use lambda_model::{RequestId, TaskId};

/// What happened to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobEventKind {
    /// Admitted into the queue.
    Submitted,
    /// Refused at admission (another job is active for the task).
    Rejected,
    /// Picked up by a worker.
    Started,
    /// Progress moved forward.
    Progress,
    Finished,
    Failed,
    /// Record removed by the caller before the job ended.
    Canceled,
    /// Terminal record dropped after its retention period.
    Pruned,
}

impl JobEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobEventKind::Submitted => "submitted",
            JobEventKind::Rejected => "rejected",
            JobEventKind::Started => "started",
            JobEventKind::Progress => "progress",
            JobEventKind::Finished => "finished",
            JobEventKind::Failed => "failed",
            JobEventKind::Canceled => "canceled",
            JobEventKind::Pruned => "pruned",
        }
    }
}

impl fmt::Display for JobEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle event.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEvent {
    pub kind: JobEventKind,
    /// Absent for rejected submissions, which never get an id.
    pub request: Option<RequestId>,
    pub task: TaskId,
    pub function: String,
    pub reason: Option<String>,
    pub progress: Option<u8>,
}

impl JobEvent {
    pub fn new(kind: JobEventKind, task: TaskId, function: impl Into<String>) -> Self {
        Self {
            kind,
            request: None,
            task,
            function: function.into(),
            reason: None,
            progress: None,
        }
    }

    pub fn with_request(mut self, id: RequestId) -> Self {
        self.request = Some(id);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Receives job events synchronously on the publishing task.
///
/// Implementations must be cheap; a panicking subscriber is logged and skipped.
pub trait Subscribe: Send + Sync + 'static {
    fn on_event(&self, event: &JobEvent);

    fn name(&self) -> &'static str;
}

/// Fan-out of events to all subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EventBus {
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subscribers }
    }

    pub fn publish(&self, event: JobEvent) {
        for sub in &self.subscribers {
            if catch_unwind(AssertUnwindSafe(|| sub.on_event(&event))).is_err() {
                error!(subscriber = sub.name(), kind = %event.kind, "subscriber panicked while processing an event");
            }
        }
    }
}
