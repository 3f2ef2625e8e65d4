use chrono::{DateTime, Utc};
use thiserror::Error;

use super::TelemetryRecord;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for TelemetryError {
    fn from(e: rusqlite::Error) -> Self {
        TelemetryError::Database(e.to_string())
    }
}

/// Filter for querying telemetry records
#[derive(Debug, Clone, Default)]
pub struct TelemetryFilter {
    pub event_type: Option<String>,
    pub file_id: Option<String>,
    pub user_id: Option<String>,
    pub error_kind: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl TelemetryFilter {
    pub fn new() -> Self {
        Self {
            limit: 100,
            offset: 0,
            ..Default::default()
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_error_kind(mut self, error_kind: impl Into<String>) -> Self {
        self.error_kind = Some(error_kind.into());
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }
}

/// Trait for telemetry storage
pub trait TelemetryStore: Send + Sync {
    /// Insert a record, returns the assigned ID
    fn insert(&self, record: &TelemetryRecord) -> Result<i64, TelemetryError>;

    /// Query records, newest first
    fn query(&self, filter: &TelemetryFilter) -> Result<Vec<TelemetryRecord>, TelemetryError>;

    /// Count matching records
    fn count(&self, filter: &TelemetryFilter) -> Result<i64, TelemetryError>;
}
