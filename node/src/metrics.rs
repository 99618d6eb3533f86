//! # Prometheus Metrics
//!
//! Operational metrics for the keystone node, scraped at `/metrics` on the
//! metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] with the
//! `keystone` prefix, so nothing collides with a default global registry.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Metric handles shared by request handlers and background tasks.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Enrollments that ended with an admitted transaction.
    pub enrollments_total: IntCounter,
    /// Refused enrollments, labelled by `reason`.
    pub enrollment_failures_total: IntCounterVec,
    /// Wall time of `PUT /signatures`, including time queued in the sequence.
    pub enrollment_latency_seconds: Histogram,
    /// Transactions currently waiting in the pool.
    pub transactions_in_pool: IntGauge,
    /// Transactions moved from the pool to confirmed state.
    pub transactions_confirmed_total: IntCounter,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("keystone".into()), None)
            .expect("failed to create prometheus registry");

        let enrollments_total = IntCounter::new(
            "enrollments_total",
            "Second-signature enrollments admitted to the pool",
        )
        .expect("metric creation");
        registry
            .register(Box::new(enrollments_total.clone()))
            .expect("metric registration");

        let enrollment_failures_total = IntCounterVec::new(
            Opts::new(
                "enrollment_failures_total",
                "Second-signature enrollments refused, by reason",
            ),
            &["reason"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(enrollment_failures_total.clone()))
            .expect("metric registration");

        let enrollment_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "enrollment_latency_seconds",
                "Enrollment request latency in seconds, queueing included",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(enrollment_latency_seconds.clone()))
            .expect("metric registration");

        let transactions_in_pool = IntGauge::new(
            "transactions_in_pool",
            "Current number of pending transactions in the pool",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_in_pool.clone()))
            .expect("metric registration");

        let transactions_confirmed_total = IntCounter::new(
            "transactions_confirmed_total",
            "Transactions promoted from the pool to confirmed state",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transactions_confirmed_total.clone()))
            .expect("metric registration");

        Self {
            registry,
            enrollments_total,
            enrollment_failures_total,
            enrollment_latency_seconds,
            transactions_in_pool,
            transactions_confirmed_total,
        }
    }

    /// Record a refused enrollment.
    pub fn record_failure(&self, reason: &str) {
        self.enrollment_failures_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_prefixed_metric_names() {
        let metrics = NodeMetrics::new();
        metrics.enrollments_total.inc();
        metrics.record_failure("invalid_passphrase");
        metrics.transactions_in_pool.set(3);

        let text = metrics.encode().unwrap();
        assert!(text.contains("keystone_enrollments_total 1"));
        assert!(text.contains(
            "keystone_enrollment_failures_total{reason=\"invalid_passphrase\"} 1"
        ));
        assert!(text.contains("keystone_transactions_in_pool 3"));
    }
}
