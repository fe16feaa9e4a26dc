//! Metrics collection abstraction for auto-annotation jobs.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are
//! handed to the service and queue as a [`MetricsHandle`].
mod backend;
pub use backend::{JobOutcome, MetricsBackend, MetricsHandle};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
