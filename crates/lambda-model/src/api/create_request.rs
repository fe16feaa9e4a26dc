use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::{
    domain::{FunctionId, Scope, SegmentId, TaskId},
    spec::MappingRequest,
};

/// Request to run a function over a whole task or one of its jobs in the background.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct CreateJobRequest {
    pub function: FunctionId,
    pub task: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<SegmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// Delete existing annotations of the scope before the run.
    #[serde(default)]
    pub cleanup: bool,
    #[serde(default)]
    pub conv_mask_to_poly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
}

impl CreateJobRequest {
    pub fn new(function: impl Into<String>, task: TaskId) -> Self {
        Self {
            function: function.into(),
            task,
            job: None,
            threshold: None,
            quality: None,
            cleanup: false,
            conv_mask_to_poly: false,
            mapping: None,
            max_distance: None,
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.task, self.job)
    }
}
