use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use autosrt_core::{TelemetryFilter, TelemetryRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

/// Maximum allowed limit for telemetry queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for telemetry queries
const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for the telemetry endpoint
#[derive(Debug, Deserialize)]
pub struct TelemetryQueryParams {
    /// Filter by event type (`job_failed`, `service_started`, ...)
    pub event_type: Option<String>,
    pub file_id: Option<String>,
    pub user_id: Option<String>,
    /// Filter by failure kind (`compute`, `decode`, ...)
    pub error_kind: Option<String>,
    /// Only events at or after this timestamp (ISO 8601)
    pub from: Option<DateTime<Utc>>,
    /// Maximum number of events to return (default 100, max 1000)
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TelemetryQueryResponse {
    pub events: Vec<TelemetryRecord>,
    /// Total number of matching events
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Query recorded telemetry events, newest first
pub async fn query_telemetry(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TelemetryQueryParams>,
) -> Result<Json<TelemetryQueryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut base_filter = TelemetryFilter::new();
    if let Some(event_type) = params.event_type {
        base_filter = base_filter.with_event_type(event_type);
    }
    if let Some(file_id) = params.file_id {
        base_filter = base_filter.with_file_id(file_id);
    }
    if let Some(user_id) = params.user_id {
        base_filter = base_filter.with_user_id(user_id);
    }
    if let Some(error_kind) = params.error_kind {
        base_filter = base_filter.with_error_kind(error_kind);
    }
    if let Some(from) = params.from {
        base_filter = base_filter.since(from);
    }

    let query_filter = TelemetryFilter {
        limit,
        offset,
        ..base_filter.clone()
    };

    let events = state.telemetry_store().query(&query_filter).map_err(|e| {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to query telemetry events: {}", e),
        )
    })?;

    let total = state.telemetry_store().count(&base_filter).map_err(|e| {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to count telemetry events: {}", e),
        )
    })?;

    Ok(Json(TelemetryQueryResponse {
        events,
        total,
        limit,
        offset,
    }))
}
