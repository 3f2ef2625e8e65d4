//! API tests driving the router in-process against a running worker pool.

mod common;

use axum::http::StatusCode;
use common::{fixtures, TestFixture};
use tokio_test::assert_ok;

use autosrt_core::compute::ComputeError;
use autosrt_core::usage::Plan;

#[tokio::test]
async fn test_health_ok_while_pool_runs() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_health_degraded_after_pool_stops() {
    let fixture = TestFixture::new().await;
    fixture.pool.shutdown();
    assert_ok!(fixture.pool.wait().await);

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["status"], "degraded");
}

#[tokio::test]
async fn test_status_reports_pool_counters() {
    let fixture = TestFixture::new().await;
    fixture.add_user("u1", Plan::Free);

    fixture
        .process(&fixtures::inline_envelope("f1", "u1", 600.0), 1)
        .await;
    fixture.queue.push_raw("not json").await;
    assert!(fixture.queue.wait_for_settlements(2, common::TIMEOUT).await);

    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["pool"]["running"], true);
    assert_eq!(response.body["pool"]["workers"], 2);
    assert_eq!(response.body["pool"]["total_processed"], 1);
    assert_eq!(response.body["pool"]["total_rejected"], 1);
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn test_config_hides_secrets() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["compute"]["function_name"], "srt-generator");
    assert_eq!(response.body["compute"]["api_key_configured"], true);
    assert_eq!(response.body["notifier"]["api_key_configured"], true);
    assert!(!response.text.contains("compute-secret"));
    assert!(!response.text.contains("mail-secret"));
}

#[tokio::test]
async fn test_usage_reflects_processed_job() {
    let fixture = TestFixture::new().await;
    fixture.add_user("u1", Plan::Free);

    fixture
        .process(&fixtures::inline_envelope("f1", "u1", 600.0), 1)
        .await;

    let response = fixture.get("/api/v1/users/u1/usage").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["plan"], "free");
    assert_eq!(response.body["monthly_usage"], 600.0);
    assert_eq!(response.body["remaining"], 1200.0);
}

#[tokio::test]
async fn test_usage_unknown_user_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/users/ghost/usage").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_history_lists_completed_conversions() {
    let fixture = TestFixture::new().await;
    fixture.add_user("u1", Plan::Pro);

    for (n, file_id) in ["f1", "f2", "f3"].iter().enumerate() {
        fixture
            .process(&fixtures::inline_envelope(file_id, "u1", 60.0), n + 1)
            .await;
    }

    let response = fixture.get("/api/v1/users/u1/history?limit=2").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 3);
    assert_eq!(response.body["limit"], 2);
    assert_eq!(response.body["records"].as_array().unwrap().len(), 2);

    let other = fixture.get("/api/v1/users/u2/history").await;
    assert_eq!(other.body["total"], 0);
}

#[tokio::test]
async fn test_history_offset_past_i64_range_is_clamped() {
    let fixture = TestFixture::new().await;
    fixture.add_user("u1", Plan::Pro);
    fixture
        .process(&fixtures::inline_envelope("f1", "u1", 60.0), 1)
        .await;

    let response = fixture
        .get("/api/v1/users/u1/history?offset=18446744073709551615")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    assert_eq!(response.body["offset"], i64::MAX);
    assert!(response.body["records"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_telemetry_exposes_failure_reports() {
    let fixture = TestFixture::new().await;
    fixture.add_user("u1", Plan::Free);
    fixture
        .compute
        .set_next_error(ComputeError::Request("connection reset".to_string()))
        .await;

    fixture
        .process(&fixtures::inline_envelope("f1", "u1", 60.0), 1)
        .await;
    assert!(fixture.wait_for_failure_reports(1).await);

    let response = fixture
        .get("/api/v1/telemetry?event_type=job_failed&file_id=f1")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 1);

    let event = &response.body["events"][0];
    assert_eq!(event["user_id"], "u1");
    assert_eq!(event["error_kind"], "compute");
    assert_eq!(event["data"]["tags"]["component"], "consumer");

    let unrelated = fixture.get("/api/v1/telemetry?file_id=other").await;
    assert_eq!(unrelated.body["total"], 0);
}

#[tokio::test]
async fn test_telemetry_limit_is_capped() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/telemetry?limit=50000").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["limit"], 1000);
}

#[tokio::test]
async fn test_metrics_endpoint_exports_pool_gauges() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("autosrt_worker_pool_size 2"));
    assert!(response.text.contains("autosrt_worker_pool_running 1"));
    assert!(response.text.contains("autosrt_http_requests_total"));
    assert!(response.text.contains("path=\"/api/v1/health\""));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
