use crate::metrics::backend::{JobOutcome, MetricsBackend};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_job_started(&self, _: &str) {}

    #[inline(always)]
    fn record_job_completed(&self, _: &str, _: JobOutcome, _: u64) {}

    #[inline(always)]
    fn record_invoke(&self, _: &str, _: bool) {}

    #[inline(always)]
    fn record_error(&self, _: &str, _: &str) {}

    #[inline(always)]
    fn record_commit(&self, _: &str, _: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_metrics_is_zero_size() {
        assert_eq!(std::mem::size_of::<NoOpMetrics>(), 0);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(JobOutcome::Success.as_label(), "success");
        assert_eq!(JobOutcome::Timeout.as_label(), "timeout");
    }
}
