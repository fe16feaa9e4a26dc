use time::OffsetDateTime;

use lambda_model::{
    CreateJobRequest, FunctionKind, JobFunctionView, JobMeta, JobStatus, JobView, RequestId, TaskId,
};

/// Queue-side state of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: RequestId,
    pub meta: JobMeta,
    pub request: CreateJobRequest,
    pub kind: FunctionKind,
    pub status: JobStatus,
    pub progress: u8,
    pub enqueued_at: OffsetDateTime,
    pub started_at: Option<OffsetDateTime>,
    pub ended_at: Option<OffsetDateTime>,
    pub exc_info: Option<String>,
}

impl JobRecord {
    pub fn queued(id: RequestId, request: CreateJobRequest, kind: FunctionKind, meta: JobMeta) -> Self {
        Self {
            id,
            meta,
            request,
            kind,
            status: JobStatus::Queued,
            progress: 0,
            enqueued_at: OffsetDateTime::now_utc(),
            started_at: None,
            ended_at: None,
            exc_info: None,
        }
    }

    pub fn is_lambda(&self) -> bool {
        self.meta.is_lambda()
    }

    /// Same-task jobs conflict while this one has not ended.
    pub fn blocks_task(&self, task: TaskId) -> bool {
        self.is_lambda() && self.request.task == task && !self.status.is_terminal()
    }

    pub fn view(&self) -> JobView {
        JobView {
            id: self.id,
            function: JobFunctionView {
                id: self.request.function.clone(),
                threshold: self.request.threshold,
                task: self.request.task,
                job: self.request.job,
            },
            status: self.status,
            progress: self.progress,
            enqueued: Some(self.enqueued_at),
            started: self.started_at,
            ended: self.ended_at,
            exc_info: self.exc_info.clone(),
        }
    }
}
