//! Long-running runs over a task: shared context, progress reporting and the detection sweep.
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use lambda_model::{
    CallRequest, FrameIndex, FunctionDescriptor, Scope, SegmentMeta, TaskMeta,
};

use crate::{
    error::CoreResult,
    invoke::InvocationBuilder,
    metrics::MetricsHandle,
    ports::{AnnotationStore, FrameSource, FunctionRegistry},
};

mod batch;
mod convert;
mod detector;
mod mask;

pub use detector::DetectionPipeline;
pub use mask::mask_to_rle;

/// Receives progress of a run and tells it whether to continue.
///
/// Returning `false` means the job record is gone; the run must stop at
/// the next opportunity without writing anything else.
pub trait Progress: Send + Sync {
    fn update(&self, percent: u8) -> bool;
}

impl<F> Progress for F
where
    F: Fn(u8) -> bool + Send + Sync,
{
    fn update(&self, percent: u8) -> bool {
        self(percent)
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Stopped early because the job was removed.
    Canceled,
}

/// Percentage of `done` out of `total`, clamped to `0..=100`.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.saturating_mul(100) / total).min(100) as u8
}

/// Everything a run needs, resolved once at job start.
pub struct RunContext {
    pub function: FunctionDescriptor,
    pub task: TaskMeta,
    pub segment: Option<SegmentMeta>,
    pub registry: Arc<dyn FunctionRegistry>,
    pub frames: Arc<dyn FrameSource>,
    pub store: Arc<dyn AnnotationStore>,
    pub metrics: MetricsHandle,
}

impl RunContext {
    pub fn scope(&self) -> Scope {
        Scope::new(self.task.id, self.segment.as_ref().map(|s| s.id))
    }

    /// Ordered task-relative frames of the scope.
    pub fn frame_set(&self) -> Vec<FrameIndex> {
        self.task.frame_set(self.segment.as_ref())
    }

    pub fn builder(&self) -> InvocationBuilder<'_> {
        InvocationBuilder::new(
            &self.function,
            &self.task,
            self.segment.as_ref(),
            self.frames.as_ref(),
        )
    }

    /// Build the payload and call the function.
    pub async fn invoke(&self, args: &CallRequest) -> CoreResult<Value> {
        let kind = self.function.kind.kind();
        let payload = self.builder().build(args).await?;

        match self.registry.invoke(&self.function, &payload).await {
            Ok(value) => {
                self.metrics.record_invoke(kind, true);
                Ok(value)
            }
            Err(e) => {
                warn!(function = %self.function.id, error = %e, "function call failed");
                self.metrics.record_invoke(kind, false);
                Err(e)
            }
        }
    }

    /// Call arguments common to every invocation of a run.
    pub fn base_args(&self) -> CallRequest {
        CallRequest {
            task: Some(self.task.id),
            job: self.segment.as_ref().map(|s| s.id),
            ..CallRequest::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent(0, 4), 0);
        assert_eq!(percent(1, 4), 25);
        assert_eq!(percent(4, 4), 100);
        assert_eq!(percent(5, 4), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn closures_report_progress() {
        let keep_going = |p: u8| p < 50;
        assert!(keep_going.update(10));
        assert!(!keep_going.update(60));
    }
}
