mod meta;
pub use meta::JobMeta;

mod constants;
pub use constants::{DEFAULT_FLUSH_EVERY, META_ORIGIN, ORIGIN_LAMBDA};

mod attribute;
pub use attribute::{AttributeSpec, InputType};

mod schema;
pub use schema::{TaskAttribute, TaskLabel, TaskLabelSchema};

mod quality;
pub use quality::Quality;

mod scope;
pub use scope::Scope;

mod task;
pub use task::{CommitMode, DataLayout, SegmentMeta, TaskMeta};

/// Identifier of an annotation task.
pub type TaskId = u64;

/// Identifier of a job segment inside a task.
pub type SegmentId = u64;

/// Identifier of a task label.
pub type LabelId = u64;

/// Identifier of a task attribute spec.
pub type AttributeId = u64;

/// Task-relative frame index.
pub type FrameIndex = u64;

/// Identifier of an inference function, e.g. `openvino-yolo-v3`.
pub type FunctionId = String;

/// Identifier of an orchestration job record.
pub type RequestId = uuid::Uuid;
