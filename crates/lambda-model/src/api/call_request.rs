use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{
    domain::{FrameIndex, SegmentId, TaskId},
    spec::MappingRequest,
};

/// Arguments of a synchronous function call.
///
/// Which fields are mandatory depends on the function kind; frame indices
/// are relative to the task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<SegmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame0: Option<FrameIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame1: Option<FrameIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_points: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neg_points: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boxes0: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boxes1: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shapes: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
}

impl CallRequest {
    pub fn for_task(task: TaskId) -> Self {
        Self {
            task: Some(task),
            ..Self::default()
        }
    }

    pub fn for_job(job: SegmentId) -> Self {
        Self {
            job: Some(job),
            ..Self::default()
        }
    }

    pub fn with_frame(mut self, frame: FrameIndex) -> Self {
        self.frame = Some(frame);
        self
    }
}
