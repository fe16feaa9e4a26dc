pub mod config;
pub mod error;
pub mod events;
pub mod invoke;
pub mod mapping;
pub mod memory;
pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod queue;
pub mod reid;
pub mod service;

mod sync;

#[cfg(test)]
mod testing;

pub use error::{CoreError, CoreResult, TransportError, ValidationError};

pub mod prelude {
    pub use crate::config::{PipelineConfig, QueueConfig};
    pub use crate::error::{CoreError, CoreResult, TransportError, ValidationError};
    pub use crate::events::{JobEvent, JobEventKind, Subscribe};
    pub use crate::invoke::Payload;
    pub use crate::metrics::{JobOutcome, MetricsBackend, MetricsHandle, noop_metrics};
    pub use crate::ports::{AnnotationStore, FrameSource, FunctionRegistry, TaskCatalog};
    pub use crate::service::{LambdaService, LambdaServiceBuilder};
}
