//! Well-known string keys shared across the model layer.

/// Metadata key naming the subsystem that enqueued a job record.
pub const META_ORIGIN: &str = "origin";

/// Value of [`META_ORIGIN`] for auto-annotation jobs.
pub const ORIGIN_LAMBDA: &str = "lambda";

/// Flush cadence of the detection pipeline, in processed frames.
pub const DEFAULT_FLUSH_EVERY: usize = 100;
