//! Prometheus backend for auto-annotation job metrics.
//!
//! [`PrometheusMetrics`] implements [`lambda_core::metrics::MetricsBackend`];
//! hand it to the service builder as a `MetricsHandle`.
//!
//! ```rust
//! use std::sync::Arc;
//! use lambda_core::metrics::MetricsHandle;
//! use lambda_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let handle: MetricsHandle = Arc::new(metrics.clone());
//!
//! // later, for a scrape
//! let text = metrics.render()?;
//! # let _ = (handle, text);
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `lambda_jobs_started_total{function_kind}` - Counter
//! - `lambda_jobs_completed_total{function_kind, outcome}` - Counter
//! - `lambda_job_duration_seconds{function_kind}` - Histogram
//! - `lambda_invocations_total{function_kind, result}` - Counter
//! - `lambda_errors_total{function_kind, error_kind}` - Counter
//! - `lambda_committed_annotations_total{function_kind}` - Counter
//!
//! No HTTP endpoint is provided; serve [`PrometheusMetrics::render`] from
//! whatever server the host process already runs.
mod backend;
pub use backend::PrometheusMetrics;
