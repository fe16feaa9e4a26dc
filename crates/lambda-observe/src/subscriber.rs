//! Structured logging of job lifecycle events.
use lambda_core::events::{JobEvent, JobEventKind, Subscribe};
use tracing::{debug, error, info, trace, warn};

/// Subscriber that writes every job event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JobEventLogger;

impl Subscribe for JobEventLogger {
    fn on_event(&self, event: &JobEvent) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "job-event-logger"
    }
}

fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());

    match e.kind() {
        JobEventKind::Submitted => {
            debug!(request = %e.request(), task = e.task(), function = e.function(), "{msg}")
        }
        JobEventKind::Rejected => {
            warn!(task = e.task(), function = e.function(), reason = e.reason(), "{msg}")
        }
        JobEventKind::Started | JobEventKind::Canceled => {
            info!(request = %e.request(), task = e.task(), function = e.function(), "{msg}")
        }
        JobEventKind::Progress => {
            trace!(request = %e.request(), task = e.task(), progress = e.progress(), "{msg}")
        }
        JobEventKind::Finished => {
            info!(request = %e.request(), task = e.task(), function = e.function(), "{msg}")
        }
        JobEventKind::Failed => error!(
            request = %e.request(),
            task = e.task(),
            function = e.function(),
            reason = e.reason(),
            "{msg}"
        ),
        JobEventKind::Pruned => trace!(request = %e.request(), task = e.task(), "{msg}"),
    }
}

fn message_for(kind: JobEventKind) -> &'static str {
    match kind {
        JobEventKind::Submitted => "lambda job submitted",
        JobEventKind::Rejected => "lambda job rejected",
        JobEventKind::Started => "lambda job started",
        JobEventKind::Progress => "lambda job progress",
        JobEventKind::Finished => "lambda job finished",
        JobEventKind::Failed => "lambda job failed",
        JobEventKind::Canceled => "lambda job canceled",
        JobEventKind::Pruned => "lambda job record pruned",
    }
}

/// Field accessors with log-friendly fallbacks.
trait View {
    fn kind(&self) -> JobEventKind;
    fn request(&self) -> String;
    fn task(&self) -> u64;
    fn function(&self) -> &str;
    fn reason(&self) -> &str;
    fn progress(&self) -> u8;
}

impl View for &JobEvent {
    fn kind(&self) -> JobEventKind {
        self.kind
    }

    fn request(&self) -> String {
        self.request.map(|id| id.to_string()).unwrap_or_else(|| "none".into())
    }

    fn task(&self) -> u64 {
        self.task
    }

    fn function(&self) -> &str {
        &self.function
    }

    fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("none")
    }

    fn progress(&self) -> u8 {
        self.progress.unwrap_or(0)
    }
}
