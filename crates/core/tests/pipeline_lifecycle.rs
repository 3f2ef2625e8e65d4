//! Pipeline lifecycle integration tests.
//!
//! These tests run the worker pool with the real job handler, ledger and
//! SQLite stores against in-memory collaborators:
//! queue -> decode -> quota check -> stage -> compute -> persist -> ack -> notify

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use autosrt_core::{
    compute::ComputeError,
    history::HistoryStore,
    telemetry::{TelemetryFilter, TelemetryStore, TelemetryWriter},
    testing::{fixtures, MockComputeService, MockNotifier, MockObjectStore, MockQueue, Settlement},
    orchestrator::OrchestratorConfig,
    usage::{Plan, PlanLimits, UsageStore},
    create_telemetry_system, ConversionOrchestrator, DispatcherConfig, JobQueue,
    SqliteHistoryStore, SqliteTelemetryStore, SqliteUsageStore, SubtitleJobHandler, UsageLedger,
    WorkerPool,
};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Test helper holding every collaborator of a running pipeline.
struct TestHarness {
    queue: Arc<MockQueue>,
    storage: Arc<MockObjectStore>,
    compute: Arc<MockComputeService>,
    notifier: Arc<MockNotifier>,
    usage: Arc<SqliteUsageStore>,
    history: Arc<SqliteHistoryStore>,
    telemetry_store: Arc<SqliteTelemetryStore>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_notifier(MockNotifier::new())
    }

    fn with_notifier(notifier: MockNotifier) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let usage = Arc::new(SqliteUsageStore::new(&db_path).expect("Failed to create usage store"));
        let history =
            Arc::new(SqliteHistoryStore::new(&db_path).expect("Failed to create history store"));
        let telemetry_store = Arc::new(
            SqliteTelemetryStore::new(&db_path).expect("Failed to create telemetry store"),
        );

        Self {
            queue: Arc::new(MockQueue::new()),
            storage: Arc::new(MockObjectStore::new()),
            compute: Arc::new(MockComputeService::new()),
            notifier: Arc::new(notifier),
            usage,
            history,
            telemetry_store,
            _temp_dir: temp_dir,
        }
    }

    /// Build a pool plus the telemetry writer it reports to.
    fn create_pool(&self, concurrency: usize) -> (WorkerPool, TelemetryWriter) {
        let (telemetry, writer) = create_telemetry_system(self.telemetry_store.clone(), 64);

        let orchestrator = Arc::new(ConversionOrchestrator::new(
            OrchestratorConfig::default(),
            "uploads",
            "srt-generator",
            self.storage.clone(),
            self.compute.clone(),
            self.history.clone(),
        ));
        let ledger = UsageLedger::new(self.usage.clone(), PlanLimits::default());
        let handler =
            Arc::new(SubtitleJobHandler::new(ledger, orchestrator).with_telemetry(telemetry.clone()));

        let pool = WorkerPool::new(
            DispatcherConfig::default().with_concurrency(concurrency),
            self.queue.clone(),
            handler,
        )
        .with_notifier(self.notifier.clone())
        .with_telemetry(telemetry);

        (pool, writer)
    }

    fn add_user(&self, user_id: &str, plan: Plan) {
        self.usage
            .upsert_user(user_id, plan)
            .expect("Failed to create user");
    }

    /// Stop the pool and flush telemetry.
    async fn finish(&self, pool: WorkerPool, writer: tokio::task::JoinHandle<()>) {
        pool.shutdown();
        pool.wait().await.expect("Pool stopped with error");
        drop(pool);
        writer.await.expect("Telemetry writer panicked");
    }

    fn failure_reports(&self, kind: &str) -> i64 {
        self.telemetry_store
            .count(&TelemetryFilter::new().with_error_kind(kind))
            .unwrap()
    }
}

#[tokio::test]
async fn test_successful_job_acks_records_and_notifies() {
    let harness = TestHarness::new();
    harness.add_user("u1", Plan::Free);
    let (pool, writer) = harness.create_pool(2);
    let writer = tokio::spawn(writer.run());
    pool.start().await.unwrap();

    harness
        .queue
        .publish(&fixtures::inline_envelope("f1", "u1", 600.0))
        .await
        .unwrap();

    assert!(harness.queue.wait_for_settlements(1, TIMEOUT).await);
    assert!(harness.notifier.wait_for_attempts(1, TIMEOUT).await);

    assert_eq!(harness.queue.acked_count().await, 1);
    assert_eq!(harness.queue.settlements().await.len(), 1);

    let record = harness.history.find("u1", "f1").unwrap().unwrap();
    assert_eq!(record.artifact_location, "mock://uploads/u1/f1/lecture.srt");

    let notifications = harness.notifier.attempts().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].address, "u1@example.com");
    assert_eq!(notifications[0].artifact_location, record.artifact_location);

    let usage = harness.usage.find_usage("u1").unwrap().unwrap();
    assert_eq!(usage.monthly_usage, 600.0);

    assert_eq!(pool.status().total_processed, 1);
    harness.finish(pool, writer).await;
    let failures = TelemetryFilter::new().with_event_type("job_failed");
    assert_eq!(harness.telemetry_store.count(&failures).unwrap(), 0);
}

#[tokio::test]
async fn test_failed_conversion_reports_and_rejects() {
    let harness = TestHarness::new();
    harness.add_user("u1", Plan::Basic);
    harness
        .compute
        .set_next_error(ComputeError::Timeout { timeout_secs: 900 })
        .await;
    let (pool, writer) = harness.create_pool(1);
    let writer = tokio::spawn(writer.run());
    pool.start().await.unwrap();

    harness
        .queue
        .publish(&fixtures::inline_envelope("f1", "u1", 120.0))
        .await
        .unwrap();
    assert!(harness.queue.wait_for_settlements(1, TIMEOUT).await);

    assert_eq!(harness.queue.rejected_count().await, 1);
    assert_eq!(harness.history.count_for_user("u1").unwrap(), 0);
    assert!(harness.usage.find_usage("u1").unwrap().is_none());
    assert_eq!(pool.status().total_failed, 1);

    harness.finish(pool, writer).await;

    let reports = harness
        .telemetry_store
        .query(&TelemetryFilter::new().with_event_type("job_failed"))
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].error_kind.as_deref(), Some("compute"));
    assert_eq!(reports[0].file_id.as_deref(), Some("f1"));
    assert_eq!(reports[0].user_id.as_deref(), Some("u1"));
    assert!(harness.notifier.attempts().await.is_empty());
}

#[tokio::test]
async fn test_quota_scenario() {
    let harness = TestHarness::new();
    harness.add_user("u1", Plan::Free);
    let (pool, writer) = harness.create_pool(1);
    let writer = tokio::spawn(writer.run());
    pool.start().await.unwrap();

    // 600s fits in the 1800s free plan.
    harness
        .queue
        .publish(&fixtures::inline_envelope("f1", "u1", 600.0))
        .await
        .unwrap();
    assert!(harness.queue.wait_for_settlements(1, TIMEOUT).await);
    assert_eq!(
        harness.usage.find_usage("u1").unwrap().unwrap().monthly_usage,
        600.0
    );

    // 600 + 1300 does not.
    harness
        .queue
        .publish(&fixtures::inline_envelope("f2", "u1", 1300.0))
        .await
        .unwrap();
    assert!(harness.queue.wait_for_settlements(2, TIMEOUT).await);

    let settlements = harness.queue.settlements().await;
    assert_eq!(settlements[0].settlement, Settlement::Acked);
    assert_eq!(settlements[1].settlement, Settlement::Rejected);
    assert_eq!(harness.compute.call_count().await, 1);
    assert_eq!(
        harness.usage.find_usage("u1").unwrap().unwrap().monthly_usage,
        600.0
    );

    harness.finish(pool, writer).await;
    assert_eq!(harness.failure_reports("quota_exceeded"), 1);
}

#[tokio::test]
async fn test_poison_message_is_rejected_once() {
    let harness = TestHarness::new();
    let (pool, writer) = harness.create_pool(2);
    let writer = tokio::spawn(writer.run());
    pool.start().await.unwrap();

    let sequence = harness.queue.push_raw(&b"{\"file_id\": 12"[..]).await;
    assert!(harness.queue.wait_for_settlements(1, TIMEOUT).await);

    // Give a wrong redelivery a chance to show up.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        harness.queue.settlements_for(sequence).await,
        vec![Settlement::Rejected]
    );
    assert_eq!(harness.compute.call_count().await, 0);
    assert_eq!(harness.storage.object_count().await, 0);
    assert_eq!(pool.status().total_rejected, 1);

    harness.finish(pool, writer).await;
    assert_eq!(harness.failure_reports("decode"), 1);
}

#[tokio::test]
async fn test_notification_failure_does_not_reprocess() {
    let harness = TestHarness::with_notifier(MockNotifier::failing());
    harness.add_user("u1", Plan::Pro);
    let (pool, writer) = harness.create_pool(2);
    let writer = tokio::spawn(writer.run());
    pool.start().await.unwrap();

    let envelope = fixtures::inline_envelope("f1", "u1", 60.0);
    harness.queue.publish(&envelope).await.unwrap();

    assert!(harness.notifier.wait_for_attempts(1, TIMEOUT).await);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let attempts = harness.notifier.attempts().await;
    assert_eq!(attempts.len(), 1);
    assert!(!attempts[0].succeeded);
    assert_eq!(harness.queue.settlements_for(1).await, vec![Settlement::Acked]);
    assert_eq!(harness.compute.call_count().await, 1);
    assert_eq!(harness.usage.find_usage("u1").unwrap().unwrap().monthly_usage, 60.0);

    harness.finish(pool, writer).await;
}

#[tokio::test]
async fn test_redelivered_job_counts_usage_once() {
    let harness = TestHarness::new();
    harness.add_user("u1", Plan::Free);
    let (pool, writer) = harness.create_pool(1);
    let writer = tokio::spawn(writer.run());
    pool.start().await.unwrap();

    let envelope = fixtures::inline_envelope("f1", "u1", 600.0);
    harness.queue.publish(&envelope).await.unwrap();
    harness.queue.publish(&envelope).await.unwrap();

    assert!(harness.queue.wait_for_settlements(2, TIMEOUT).await);
    assert_eq!(harness.queue.acked_count().await, 2);

    assert_eq!(harness.history.count_for_user("u1").unwrap(), 1);
    assert_eq!(harness.compute.call_count().await, 1);
    let usage = harness.usage.find_usage("u1").unwrap().unwrap();
    assert_eq!(usage.monthly_usage, 600.0);
    assert_eq!(usage.total_usage, 600.0);

    harness.finish(pool, writer).await;
}
