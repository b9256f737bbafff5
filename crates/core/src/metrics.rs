//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Batches (submissions, outcomes, reaping)
//! - Item fetches (results, durations)
//! - Archives (served, cleanup failures)
//! - External services (playlist catalog)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batches submitted total.
pub static BATCHES_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("tunebatch_batches_submitted_total", "Total batches submitted").unwrap()
});

/// Batches finished total by terminal status.
pub static BATCHES_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunebatch_batches_finished_total", "Total batches finished"),
        &["status"], // "completed", "cancelled"
    )
    .unwrap()
});

/// Batches removed by the TTL reaper.
pub static BATCHES_REAPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tunebatch_batches_reaped_total",
        "Batches removed by the time-to-live sweep",
    )
    .unwrap()
});

/// Work items processed by result.
pub static ITEMS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunebatch_items_processed_total", "Total work items processed"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Fetch Metrics
// =============================================================================

/// Fetcher invocations by implementation and status.
pub static FETCH_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunebatch_fetch_requests_total", "Total fetcher invocations"),
        &["fetcher", "status"],
    )
    .unwrap()
});

/// Duration of a single fetch in seconds.
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("tunebatch_fetch_duration_seconds", "Duration of item fetches")
            .buckets(vec![1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Archive Metrics
// =============================================================================

/// Archives built and handed out.
pub static ARCHIVES_SERVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("tunebatch_archives_served_total", "Total batch archives served").unwrap()
});

/// Single-item files handed out.
pub static SINGLE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunebatch_single_fetches_total", "Total single-item fetches"),
        &["result"],
    )
    .unwrap()
});

/// Cleanup steps that failed (best effort, logged only).
pub static CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "tunebatch_cleanup_failures_total",
        "Artifact cleanup steps that failed",
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tunebatch_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Batches
        Box::new(BATCHES_SUBMITTED.clone()),
        Box::new(BATCHES_FINISHED.clone()),
        Box::new(BATCHES_REAPED.clone()),
        Box::new(ITEMS_PROCESSED.clone()),
        // Fetches
        Box::new(FETCH_REQUESTS.clone()),
        Box::new(FETCH_DURATION.clone()),
        // Archives
        Box::new(ARCHIVES_SERVED.clone()),
        Box::new(SINGLE_FETCHES.clone()),
        Box::new(CLEANUP_FAILURES.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
