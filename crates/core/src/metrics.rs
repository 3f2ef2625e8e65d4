//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Dispatcher (jobs, poison messages, notifications)
//! - Usage ledger (quota rejections, recorded seconds)
//! - Orchestrator (compute calls)

use once_cell::sync::Lazy;
use prometheus::{Counter, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Dispatcher
// =============================================================================

/// Jobs processed by result.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("autosrt_jobs_total", "Total jobs processed"),
        &["result", "kind"], // result: "success", "failure"; kind: error kind or "none"
    )
    .unwrap()
});

/// Time from job start to settlement.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("autosrt_job_duration_seconds", "Duration of job processing")
            .buckets(vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

/// Messages rejected because they could not be decoded.
pub static POISON_MESSAGES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "autosrt_poison_messages_total",
        "Messages rejected without processing because they could not be decoded",
    )
    .unwrap()
});

/// Completion notifications by result.
pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("autosrt_notifications_total", "Completion notifications sent"),
        &["result"], // "sent", "failed"
    )
    .unwrap()
});

// =============================================================================
// Usage
// =============================================================================

/// Jobs refused because the user is over quota.
pub static QUOTA_REJECTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "autosrt_quota_rejections_total",
        "Jobs refused because the monthly limit would be exceeded",
    )
    .unwrap()
});

/// Processed media seconds recorded against users.
pub static USAGE_SECONDS_RECORDED: Lazy<Counter> = Lazy::new(|| {
    Counter::new(
        "autosrt_usage_seconds_recorded_total",
        "Media seconds recorded in the usage ledger",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator
// =============================================================================

/// Compute invocation duration in seconds.
pub static COMPUTE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "autosrt_compute_duration_seconds",
            "Duration of external compute invocations",
        )
        .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 900.0]),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

/// Returns all metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Dispatcher
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(POISON_MESSAGES.clone()),
        Box::new(NOTIFICATIONS_TOTAL.clone()),
        // Usage
        Box::new(QUOTA_REJECTIONS.clone()),
        Box::new(USAGE_SECONDS_RECORDED.clone()),
        // Orchestrator
        Box::new(COMPUTE_DURATION.clone()),
    ]
}
