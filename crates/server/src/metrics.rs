//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the tunebatch server:
//! - HTTP request metrics (latency, counts, errors)
//! - Batch counts by status and fetch slot usage (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tunebatch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 60.0, 300.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunebatch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tunebatch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics (collected dynamically)
// =============================================================================

/// Orchestrator running state (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tunebatch_orchestrator_running",
        "Whether the orchestrator is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Registered batches by status.
pub static BATCHES_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("tunebatch_batches_by_status", "Current batch count by status"),
        &["status"],
    )
    .unwrap()
});

/// Batches whose archive is being built or streamed.
pub static BATCHES_ARCHIVING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tunebatch_batches_archiving",
        "Number of batches with an archive in progress",
    )
    .unwrap()
});

/// Free fetch slots.
pub static FETCH_SLOTS_AVAILABLE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tunebatch_fetch_slots_available",
        "Number of fetch slots not currently in use",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Orchestrator
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(BATCHES_BY_STATUS.clone()))
        .unwrap();
    registry
        .register(Box::new(BATCHES_ARCHIVING.clone()))
        .unwrap();
    registry
        .register(Box::new(FETCH_SLOTS_AVAILABLE.clone()))
        .unwrap();

    // Core metrics (batches, fetches, archives, external services)
    for metric in tunebatch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the registry right now.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status();

    ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });
    BATCHES_BY_STATUS
        .with_label_values(&["running"])
        .set(status.running_batches as i64);
    BATCHES_BY_STATUS
        .with_label_values(&["completed"])
        .set(status.completed_batches as i64);
    BATCHES_BY_STATUS
        .with_label_values(&["cancelled"])
        .set(status.cancelled_batches as i64);
    BATCHES_ARCHIVING.set(status.archiving_batches as i64);
    FETCH_SLOTS_AVAILABLE.set(status.fetch_slots_available as i64);
}
