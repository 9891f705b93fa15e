// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Service source.
//!
//! Every metric name carries the `svcdns_` prefix.
//!
//! # Metrics Categories
//!
//! - **Pass Metrics** - Count and time reconciliation passes
//! - **Output Metrics** - Size of the last computed record list
//! - **Skip and Error Metrics** - Services skipped and failed lookups
//!
//! # Example
//!
//! ```rust,no_run
//! use svcdns::metrics::record_pass_success;
//!
//! record_pass_success(std::time::Duration::from_millis(20), 3);
//! ```

use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics
const METRICS_NAMESPACE: &str = "svcdns";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Pass Metrics
// ============================================================================

/// Total number of reconciliation passes
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static PASSES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_passes_total"),
        "Total number of reconciliation passes by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliation passes in seconds
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static PASS_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_pass_duration_seconds"),
        "Duration of reconciliation passes in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Output Metrics
// ============================================================================

/// Number of endpoints produced by the last successful pass
pub static ENDPOINTS: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        format!("{METRICS_NAMESPACE}_endpoints"),
        "Number of endpoints produced by the last successful pass",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Skip and Error Metrics
// ============================================================================

/// Total number of Services skipped during passes
///
/// Labels:
/// - `reason`: Why the Service was skipped (`controller`, `no_endpoints`)
pub static SERVICES_SKIPPED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_services_skipped_total"),
        "Total number of services skipped by reason",
    );
    let counter = CounterVec::new(opts, &["reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of failed lookups
///
/// Labels:
/// - `kind`: Error kind (`not_found`, `resolution`, `kube`, ...)
pub static LOOKUP_ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_lookup_errors_total"),
        "Total number of failed cluster state or DNS lookups by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful pass and the number of endpoints it produced
///
/// # Arguments
/// * `duration` - Duration of the pass
/// * `endpoints` - Number of endpoints returned
#[allow(clippy::cast_precision_loss)]
pub fn record_pass_success(duration: Duration, endpoints: usize) {
    PASSES_TOTAL.with_label_values(&["success"]).inc();
    PASS_DURATION_SECONDS
        .with_label_values(&["success"])
        .observe(duration.as_secs_f64());
    ENDPOINTS.set(endpoints as f64);
}

/// Record a failed pass
///
/// # Arguments
/// * `duration` - Duration of the pass before failure
pub fn record_pass_error(duration: Duration) {
    PASSES_TOTAL.with_label_values(&["error"]).inc();
    PASS_DURATION_SECONDS
        .with_label_values(&["error"])
        .observe(duration.as_secs_f64());
}

/// Record a skipped Service
pub fn record_service_skipped(reason: &str) {
    SERVICES_SKIPPED_TOTAL.with_label_values(&[reason]).inc();
}

/// Record a failed lookup
pub fn record_lookup_error(kind: &str) {
    LOOKUP_ERRORS_TOTAL.with_label_values(&[kind]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Returns
/// Prometheus-formatted metrics as a String
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
