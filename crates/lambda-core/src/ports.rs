//! Collaborators the core consumes.
//!
//! Everything that touches the network, media storage or the annotation
//! database sits behind one of these traits.
use async_trait::async_trait;
use serde_json::Value;

use lambda_model::{
    CommitMode, FrameIndex, FunctionDescriptor, LabeledData, Quality, Scope, SegmentId,
    SegmentMeta, TaskId, TaskMeta,
};

use crate::{error::CoreResult, invoke::Payload};

/// Registry of deployed inference functions.
#[async_trait]
pub trait FunctionRegistry: Send + Sync + 'static {
    /// All functions with a valid descriptor.
    async fn list(&self) -> CoreResult<Vec<FunctionDescriptor>>;

    /// One function by id; missing or invalid descriptors are not found.
    async fn get(&self, id: &str) -> CoreResult<FunctionDescriptor>;

    /// Call a function and return its decoded JSON body.
    async fn invoke(&self, function: &FunctionDescriptor, payload: &Payload) -> CoreResult<Value>;
}

/// Encoded frame images of a task.
#[async_trait]
pub trait FrameSource: Send + Sync + 'static {
    async fn frame(&self, task: TaskId, frame: FrameIndex, quality: Quality) -> CoreResult<Vec<u8>>;
}

/// Task and segment metadata lookup.
#[async_trait]
pub trait TaskCatalog: Send + Sync + 'static {
    async fn task(&self, id: TaskId) -> CoreResult<TaskMeta>;

    async fn segment(&self, id: SegmentId) -> CoreResult<SegmentMeta>;
}

/// Annotation storage of tasks and jobs.
#[async_trait]
pub trait AnnotationStore: Send + Sync + 'static {
    async fn data(&self, scope: Scope) -> CoreResult<LabeledData>;

    /// Rejections are reported as [`crate::CoreError::Store`].
    async fn commit(&self, scope: Scope, data: LabeledData, mode: CommitMode) -> CoreResult<()>;

    async fn delete(&self, scope: Scope) -> CoreResult<()>;
}
