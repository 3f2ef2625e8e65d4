pub mod compute;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod envelope;
pub mod history;
pub mod metrics;
pub mod notify;
pub mod orchestrator;
pub mod queue;
pub mod storage;
pub mod telemetry;
pub mod testing;
pub mod usage;

pub use compute::{ComputeService, HttpComputeClient};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use dispatcher::{
    DispatcherConfig, DispatcherError, FailureDisposition, JobHandler, JobOutcome, PoolStatus,
    WorkerPool,
};
pub use envelope::{ConversionOptions, DecodeError, FilePayload, JobEnvelope};
pub use history::{HistoryRecord, HistoryStore, SqliteHistoryStore};
pub use notify::{HttpEmailNotifier, LogNotifier, Notifier};
pub use orchestrator::{ConversionError, ConversionOrchestrator, JobError, SubtitleJobHandler};
pub use queue::{JobQueue, NatsJobQueue};
pub use storage::{FsObjectStore, ObjectStore};
pub use telemetry::{
    create_telemetry_system, SqliteTelemetryStore, TelemetryEvent, TelemetryFilter,
    TelemetryHandle, TelemetryRecord, TelemetryStore,
};
pub use usage::{Plan, SqliteUsageStore, UsageLedger, UsageStore, UsageSummary};
