//! Common test utilities for API testing with mocks.
//!
//! Builds the real router and worker pool over in-memory collaborators and
//! SQLite stores in a temporary directory. Requests are driven in-process.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use autosrt_core::{
    create_telemetry_system, load_config_from_str,
    testing::{MockComputeService, MockNotifier, MockObjectStore, MockQueue},
    usage::Plan,
    Config, ConversionOrchestrator, DispatcherConfig, HistoryStore, JobEnvelope, JobQueue,
    SqliteHistoryStore, SqliteTelemetryStore, SqliteUsageStore, SubtitleJobHandler,
    TelemetryFilter, TelemetryStore, UsageLedger, UsageStore, WorkerPool,
};
use autosrt_server::api::create_router;
use autosrt_server::state::AppState;

/// Re-export fixtures for test convenience
pub use autosrt_core::testing::fixtures;

pub const TIMEOUT: Duration = Duration::from_secs(5);

const TEST_CONFIG: &str = r#"
[compute]
endpoint = "http://compute.internal"
function_name = "srt-generator"
api_key = "compute-secret"

[storage]
bucket = "uploads"

[notifier]
api_url = "http://mail.internal/emails"
api_key = "mail-secret"
from_address = "noreply@example.com"
"#;

/// Test fixture with a running worker pool behind the router.
pub struct TestFixture {
    pub router: Router,
    pub pool: Arc<WorkerPool>,
    pub queue: Arc<MockQueue>,
    pub compute: Arc<MockComputeService>,
    pub notifier: Arc<MockNotifier>,
    pub usage: Arc<SqliteUsageStore>,
    pub telemetry_store: Arc<SqliteTelemetryStore>,
    _writer: JoinHandle<()>,
    _temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let mut config: Config = load_config_from_str(TEST_CONFIG).expect("Invalid test config");
        config.database.path = db_path.clone();

        let usage = Arc::new(SqliteUsageStore::new(&db_path).expect("Failed to create usage store"));
        let history: Arc<dyn HistoryStore> =
            Arc::new(SqliteHistoryStore::new(&db_path).expect("Failed to create history store"));
        let telemetry_store = Arc::new(
            SqliteTelemetryStore::new(&db_path).expect("Failed to create telemetry store"),
        );

        let (telemetry, writer) =
            create_telemetry_system(telemetry_store.clone() as Arc<dyn TelemetryStore>, 64);
        let writer = tokio::spawn(writer.run());

        let queue = Arc::new(MockQueue::new());
        let storage = Arc::new(MockObjectStore::new());
        let compute = Arc::new(MockComputeService::new());
        let notifier = Arc::new(MockNotifier::new());

        let orchestrator = Arc::new(ConversionOrchestrator::new(
            config.orchestrator.clone(),
            config.storage.bucket.clone(),
            config.compute.function_name.clone(),
            storage,
            compute.clone(),
            Arc::clone(&history),
        ));
        let ledger = UsageLedger::new(
            usage.clone() as Arc<dyn UsageStore>,
            config.plans.clone(),
        );
        let handler = SubtitleJobHandler::new(ledger.clone(), orchestrator)
            .with_telemetry(telemetry.clone());

        let pool = Arc::new(
            WorkerPool::new(
                DispatcherConfig::default().with_concurrency(2),
                queue.clone() as Arc<dyn JobQueue>,
                Arc::new(handler),
            )
            .with_notifier(notifier.clone())
            .with_telemetry(telemetry),
        );
        pool.start().await.expect("Failed to start pool");

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&pool),
            ledger,
            history,
            telemetry_store.clone(),
        ));

        Self {
            router: create_router(state),
            pool,
            queue,
            compute,
            notifier,
            usage,
            telemetry_store,
            _writer: writer,
            _temp_dir: temp_dir,
        }
    }

    pub fn add_user(&self, user_id: &str, plan: Plan) {
        self.usage
            .upsert_user(user_id, plan)
            .expect("Failed to create user");
    }

    /// Publish a job and wait until the pool has settled `settled_total` messages.
    pub async fn process(&self, envelope: &JobEnvelope, settled_total: usize) {
        self.queue.publish(envelope).await.expect("Failed to publish");
        assert!(
            self.queue.wait_for_settlements(settled_total, TIMEOUT).await,
            "job was not settled in time"
        );
    }

    /// Wait for the telemetry writer to persist `count` failure reports.
    pub async fn wait_for_failure_reports(&self, count: i64) -> bool {
        let filter = TelemetryFilter::new().with_event_type("job_failed");
        let deadline = tokio::time::Instant::now() + TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            if self.telemetry_store.count(&filter).unwrap_or(0) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("Failed to build request"),
            )
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }
}

impl Drop for TestFixture {
    fn drop(&mut self) {
        self.pool.shutdown();
    }
}
