use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    domain::{FunctionId, RequestId, SegmentId, TaskId},
    kind::JobStatus,
};

/// Function part of a [`JobView`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobFunctionView {
    pub id: FunctionId,
    pub threshold: Option<f64>,
    pub task: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<SegmentId>,
}

/// Externally visible state of an orchestration job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub id: RequestId,
    pub function: JobFunctionView,
    pub status: JobStatus,
    /// Percent in `0..=100`.
    pub progress: u8,
    #[serde(with = "time::serde::rfc3339::option")]
    pub enqueued: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended: Option<OffsetDateTime>,
    pub exc_info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_timestamps_as_rfc3339() {
        let view = JobView {
            id: RequestId::nil(),
            function: JobFunctionView {
                id: "yolo".into(),
                threshold: Some(0.5),
                task: 1,
                job: None,
            },
            status: JobStatus::Queued,
            progress: 0,
            enqueued: Some(OffsetDateTime::UNIX_EPOCH),
            started: None,
            ended: None,
            exc_info: None,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["enqueued"], "1970-01-01T00:00:00Z");
        assert!(json["started"].is_null());
        assert_eq!(json["status"], "queued");
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert!(json["function"].get("job").is_none());
    }
}
