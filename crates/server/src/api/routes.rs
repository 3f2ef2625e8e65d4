use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, telemetry, users};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, status and config
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/config", get(handlers::get_config))
        // Failure reports
        .route("/telemetry", get(telemetry::query_telemetry))
        // Per-user usage and history
        .route("/users/{user_id}/usage", get(users::get_usage))
        .route("/users/{user_id}/history", get(users::list_history));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
