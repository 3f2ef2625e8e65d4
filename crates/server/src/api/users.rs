use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use autosrt_core::{HistoryRecord, UsageSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::handlers::{error_response, ErrorResponse};
use crate::state::AppState;

const MAX_LIMIT: usize = 500;
const DEFAULT_LIMIT: usize = 50;
/// Largest offset SQLite can represent.
const MAX_OFFSET: usize = i64::MAX as usize;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Current plan, limit and consumption for a user
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<UsageSummary> {
    match state.ledger().summary(&user_id) {
        Ok(Some(summary)) => Ok(Json(summary)),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("User not found: {}", user_id),
        )),
        Err(e) => Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to load usage: {}", e),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQueryParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub records: Vec<HistoryRecord>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

/// Completed conversions for a user, newest first
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryQueryParams>,
) -> ApiResult<HistoryResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).min(MAX_OFFSET);

    let records = state
        .history()
        .list_for_user(&user_id, limit, offset)
        .map_err(|e| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list history: {}", e),
            )
        })?;

    let total = state.history().count_for_user(&user_id).map_err(|e| {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to count history: {}", e),
        )
    })?;

    Ok(Json(HistoryResponse {
        records,
        total,
        limit,
        offset,
    }))
}
