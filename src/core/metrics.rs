//! Prometheus metrics for monitoring the commit server.
//!
//! A single process-wide registry tracks inbound requests, upstream provider
//! calls, and access-guard denials. Everything is exposed at `GET /metrics`.

use prometheus::{
    register_gauge_vec, register_histogram_vec, register_int_counter,
    register_int_counter_vec, GaugeVec, HistogramVec, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use std::time::Duration;

/// Container for all application metrics.
pub struct Metrics {
    /// Total number of requests by method, endpoint, and status
    pub request_count: IntCounterVec,

    /// Request duration histogram in seconds
    pub request_duration: HistogramVec,

    /// Number of currently active requests by endpoint
    pub active_requests: GaugeVec,

    /// Upstream generation calls by provider and outcome
    pub upstream_requests: IntCounterVec,

    /// Upstream response latency histogram in seconds
    pub upstream_latency: HistogramVec,

    /// Requests rejected by the access guard
    pub access_denied: IntCounter,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Initialize the metrics registry.
///
/// This should be called once at application startup. Subsequent calls
/// return the same instance.
///
/// # Examples
///
/// ```no_run
/// use commit_server::core::metrics::init_metrics;
///
/// let metrics = init_metrics();
/// metrics.request_count.with_label_values(&["GET", "/healthz", "200"]).inc();
/// ```
pub fn init_metrics() -> &'static Metrics {
    METRICS.get_or_init(|| {
        let request_count = register_int_counter_vec!(
            "commit_server_requests_total",
            "Total number of requests",
            &["method", "endpoint", "status_code"]
        )
        .expect("Failed to register request_count metric");

        let request_duration = register_histogram_vec!(
            "commit_server_request_duration_seconds",
            "Request duration in seconds",
            &["method", "endpoint"],
            vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]
        )
        .expect("Failed to register request_duration metric");

        let active_requests = register_gauge_vec!(
            "commit_server_active_requests",
            "Number of active requests",
            &["endpoint"]
        )
        .expect("Failed to register active_requests metric");

        let upstream_requests = register_int_counter_vec!(
            "commit_server_upstream_requests_total",
            "Total number of upstream generation calls",
            &["provider", "outcome"]
        )
        .expect("Failed to register upstream_requests metric");

        let upstream_latency = register_histogram_vec!(
            "commit_server_upstream_latency_seconds",
            "Upstream provider response latency in seconds",
            &["provider"],
            vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]
        )
        .expect("Failed to register upstream_latency metric");

        let access_denied = register_int_counter!(
            "commit_server_access_denied_total",
            "Requests rejected by the access guard"
        )
        .expect("Failed to register access_denied metric");

        Metrics {
            request_count,
            request_duration,
            active_requests,
            upstream_requests,
            upstream_latency,
            access_denied,
        }
    })
}

/// Get the global metrics instance, registering it on first use.
pub fn get_metrics() -> &'static Metrics {
    init_metrics()
}

/// Record one finished upstream call.
pub fn record_upstream_call(provider: &str, outcome: &str, elapsed: Duration) {
    let metrics = get_metrics();
    metrics
        .upstream_requests
        .with_label_values(&[provider, outcome])
        .inc();
    metrics
        .upstream_latency
        .with_label_values(&[provider])
        .observe(elapsed.as_secs_f64());
}

/// Record one request turned away by the access guard.
pub fn record_access_denied() {
    get_metrics().access_denied.inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = init_metrics();
        metrics
            .request_count
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let metrics2 = get_metrics();
        assert!(std::ptr::eq(metrics, metrics2));
    }

    #[test]
    fn test_request_count_metric() {
        let metrics = init_metrics();
        let labels = ["POST", "/unique-count-endpoint", "201"];

        let initial = metrics.request_count.with_label_values(&labels).get();
        metrics.request_count.with_label_values(&labels).inc();
        let after = metrics.request_count.with_label_values(&labels).get();

        assert_eq!(after, initial + 1);
    }

    #[test]
    fn test_active_requests_metric() {
        let metrics = init_metrics();
        let gauge = metrics.active_requests.with_label_values(&["/unique-active"]);

        let initial = gauge.get();
        gauge.inc();
        assert_eq!(gauge.get(), initial + 1.0);
        gauge.dec();
        assert_eq!(gauge.get(), initial);
    }

    #[test]
    fn test_record_upstream_call() {
        let metrics = init_metrics();
        let provider = "provider-under-test";

        let initial = metrics
            .upstream_requests
            .with_label_values(&[provider, "success"])
            .get();
        let initial_samples = metrics
            .upstream_latency
            .with_label_values(&[provider])
            .get_sample_count();

        record_upstream_call(provider, "success", Duration::from_millis(250));

        assert_eq!(
            metrics
                .upstream_requests
                .with_label_values(&[provider, "success"])
                .get(),
            initial + 1
        );
        assert_eq!(
            metrics
                .upstream_latency
                .with_label_values(&[provider])
                .get_sample_count(),
            initial_samples + 1
        );
    }

    #[test]
    fn test_record_access_denied() {
        let metrics = init_metrics();
        let initial = metrics.access_denied.get();
        record_access_denied();
        assert!(metrics.access_denied.get() >= initial + 1);
    }
}
