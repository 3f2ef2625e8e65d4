//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the worker process:
//! - HTTP request metrics for the operational endpoints
//! - Worker pool status (collected dynamically)
//! - Everything exported by `autosrt_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::state::AppState;

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
            "autosrt_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("autosrt_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "autosrt_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Worker Pool Metrics (collected dynamically)
// =============================================================================

/// Pool running state (1 = running, 0 = stopped).
pub static WORKER_POOL_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "autosrt_worker_pool_running",
        "Whether the worker pool is pulling jobs (1) or stopped (0)",
    )
    .unwrap()
});

/// Configured worker count.
pub static WORKER_POOL_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("autosrt_worker_pool_size", "Configured number of workers").unwrap()
});

/// Workers currently processing a job.
pub static WORKERS_BUSY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "autosrt_workers_busy",
        "Number of workers currently processing a job",
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

    // Worker pool
    registry
        .register(Box::new(WORKER_POOL_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(WORKER_POOL_SIZE.clone()))
        .unwrap();
    registry.register(Box::new(WORKERS_BUSY.clone())).unwrap();

    // Core metrics (dispatcher, usage, compute)
    for metric in autosrt_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the pool gauges reflect the current snapshot.
pub fn collect_dynamic_metrics(state: &AppState) {
    let status = state.pool().status();
    WORKER_POOL_RUNNING.set(if status.running { 1 } else { 0 });
    WORKER_POOL_SIZE.set(status.workers as i64);
    WORKERS_BUSY.set(status.busy as i64);
}
