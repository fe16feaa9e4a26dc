use std::sync::Arc;

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder, proto::MetricFamily};

use lambda_core::metrics::{JobOutcome, MetricsBackend};

const NAMESPACE: &str = "lambda";

/// Prometheus metrics backend.
///
/// Label cardinality is bounded:
/// - `function_kind`: "detector", "interactor", "reid", "tracker"
/// - `outcome`: "success", "failure", "canceled", "timeout"
/// - `result`: "ok", "error"
/// - `error_kind`: the static `CoreError::kind` labels
#[derive(Clone)]
pub struct PrometheusMetrics {
    jobs_started: CounterVec,
    jobs_completed: CounterVec,
    job_duration: HistogramVec,
    invocations: CounterVec,
    errors: CounterVec,
    committed: CounterVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register all families on `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let jobs_started = counter(
            &registry,
            "jobs_started_total",
            "Lambda jobs picked up by a worker",
            &["function_kind"],
        )?;
        let jobs_completed = counter(
            &registry,
            "jobs_completed_total",
            "Lambda jobs that reached a terminal state",
            &["function_kind", "outcome"],
        )?;

        let job_duration = HistogramVec::new(
            HistogramOpts::new("job_duration_seconds", "Lambda job run time in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0]),
            &["function_kind"],
        )?;
        registry.register(Box::new(job_duration.clone()))?;

        let invocations = counter(
            &registry,
            "invocations_total",
            "Calls to inference functions",
            &["function_kind", "result"],
        )?;
        let errors = counter(
            &registry,
            "errors_total",
            "Errors raised while running lambda jobs",
            &["function_kind", "error_kind"],
        )?;
        let committed = counter(
            &registry,
            "committed_annotations_total",
            "Annotations written to the store",
            &["function_kind"],
        )?;

        Ok(Self {
            jobs_started,
            jobs_completed,
            job_duration,
            invocations,
            errors,
            committed,
            registry,
        })
    }

    /// Backend with a private registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition format, as served on `/metrics`.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

fn counter(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> Result<CounterVec, prometheus::Error> {
    let vec = CounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

impl MetricsBackend for PrometheusMetrics {
    fn record_job_started(&self, function_kind: &str) {
        self.jobs_started.with_label_values(&[function_kind]).inc();
    }

    fn record_job_completed(&self, function_kind: &str, outcome: JobOutcome, duration_ms: u64) {
        self.jobs_completed
            .with_label_values(&[function_kind, outcome.as_label()])
            .inc();
        self.job_duration
            .with_label_values(&[function_kind])
            .observe(duration_ms as f64 / 1000.0);
    }

    fn record_invoke(&self, function_kind: &str, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.invocations.with_label_values(&[function_kind, result]).inc();
    }

    fn record_error(&self, function_kind: &str, error_kind: &str) {
        self.errors.with_label_values(&[function_kind, error_kind]).inc();
    }

    fn record_commit(&self, function_kind: &str, items: usize) {
        self.committed
            .with_label_values(&[function_kind])
            .inc_by(items as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> &'a MetricFamily {
        families
            .iter()
            .find(|f| f.name() == name)
            .unwrap_or_else(|| panic!("{name} not registered"))
    }

    #[test]
    fn job_started_counts_per_kind() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_job_started("detector");
        metrics.record_job_started("detector");
        metrics.record_job_started("reid");

        let families = metrics.gather();
        let started = family(&families, "lambda_jobs_started_total");
        assert_eq!(started.get_metric().len(), 2);
    }

    #[test]
    fn job_completed_feeds_counter_and_histogram() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_job_completed("detector", JobOutcome::Success, 1500);
        metrics.record_job_completed("detector", JobOutcome::Canceled, 20);

        let families = metrics.gather();
        assert_eq!(family(&families, "lambda_jobs_completed_total").get_metric().len(), 2);

        let duration = family(&families, "lambda_job_duration_seconds");
        assert_eq!(duration.get_metric().len(), 1);
        assert!(
            metrics
                .render()
                .unwrap()
                .contains("lambda_job_duration_seconds_count{function_kind=\"detector\"} 2")
        );
    }

    #[test]
    fn invocations_split_by_result() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_invoke("detector", true);
        metrics.record_invoke("detector", false);
        metrics.record_invoke("detector", true);

        let families = metrics.gather();
        assert_eq!(family(&families, "lambda_invocations_total").get_metric().len(), 2);
    }

    #[test]
    fn errors_and_commits_are_recorded() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_error("detector", "upstream");
        metrics.record_commit("detector", 100);
        metrics.record_commit("detector", 50);

        let families = metrics.gather();
        assert_eq!(family(&families, "lambda_errors_total").get_metric().len(), 1);

        let text = metrics.render().unwrap();
        assert!(text.contains("lambda_committed_annotations_total{function_kind=\"detector\"} 150"));
    }

    #[test]
    fn render_uses_text_format() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_job_started("reid");

        let text = metrics.render().unwrap();
        assert!(text.contains("lambda_jobs_started_total{function_kind=\"reid\"} 1"));
    }

    #[test]
    fn double_registration_fails() {
        let registry = Arc::new(Registry::new());
        PrometheusMetrics::new_with_registry(registry.clone()).unwrap();
        assert!(PrometheusMetrics::new_with_registry(registry).is_err());
    }
}
