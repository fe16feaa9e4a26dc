mod domain;
pub use domain::{
    AttributeId, AttributeSpec, CommitMode, DEFAULT_FLUSH_EVERY, DataLayout, FrameIndex,
    FunctionId, InputType, JobMeta, LabelId, META_ORIGIN, ORIGIN_LAMBDA, Quality, RequestId, Scope,
    SegmentId, SegmentMeta, TaskAttribute, TaskId, TaskLabel, TaskLabelSchema, TaskMeta,
};

mod error;
pub use error::{ModelError, ModelResult};

mod kind;
pub use kind::{FunctionKind, JobStatus};

mod descriptor;
pub use descriptor::{FunctionDescriptor, FunctionView, InteractiveConfig};

mod annotation;
pub use annotation::{
    AttributeValue, InferredAnnotation, InferredAttribute, LabeledData, LabeledShape, LabeledTag,
    LabeledTrack, ShapeType, Source, TAG_KIND, TrackedShape,
};

mod spec;
pub use spec::{LabelMappingEntry, MappingRequest};

mod api;
pub use api::{CallRequest, CreateJobRequest, JobFunctionView, JobView};
