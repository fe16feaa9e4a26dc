//! In-process job queue.
//!
//! Records carry the `origin=lambda` tag; anything else in the table is
//! invisible to [`LocalQueue::fetch`] and [`LocalQueue::list`].
mod local;
mod record;

pub use local::{JobFuture, LocalQueue, ProgressHandle, Work, work};
pub use record::JobRecord;
