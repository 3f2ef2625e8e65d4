use std::sync::Arc;
use std::time::Instant;

use autosrt_core::{
    Config, HistoryStore, SanitizedConfig, TelemetryStore, UsageLedger, WorkerPool,
};

/// Shared application state
pub struct AppState {
    config: Config,
    pool: Arc<WorkerPool>,
    ledger: UsageLedger,
    history: Arc<dyn HistoryStore>,
    telemetry_store: Arc<dyn TelemetryStore>,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: Arc<WorkerPool>,
        ledger: UsageLedger,
        history: Arc<dyn HistoryStore>,
        telemetry_store: Arc<dyn TelemetryStore>,
    ) -> Self {
        Self {
            config,
            pool,
            ledger,
            history,
            telemetry_store,
            started_at: Instant::now(),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pool(&self) -> &WorkerPool {
        self.pool.as_ref()
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn history(&self) -> &dyn HistoryStore {
        self.history.as_ref()
    }

    pub fn telemetry_store(&self) -> &dyn TelemetryStore {
        self.telemetry_store.as_ref()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
