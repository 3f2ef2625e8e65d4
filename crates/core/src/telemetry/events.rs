use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::{ConversionOptions, JobEnvelope};

pub const COMPONENT_CONSUMER: &str = "consumer";
pub const SERVICE_FILE_CONVERSION: &str = "file_conversion";
pub const ACTION_SRT_PROCESSING: &str = "srt_processing";
pub const ACTION_USAGE_RECORDING: &str = "usage_recording";
pub const ACTION_DECODE: &str = "envelope_decode";

/// Tags used to group failures in the error record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureTags {
    pub component: String,
    pub service: String,
    pub action: String,
}

impl FailureTags {
    pub fn consumer(action: &str) -> Self {
        Self {
            component: COMPONENT_CONSUMER.to_string(),
            service: SERVICE_FILE_CONVERSION.to_string(),
            action: action.to_string(),
        }
    }
}

/// The file a failed job was about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContext {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub duration: f64,
}

/// The user a failed job belonged to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub id: String,
    pub email: String,
}

/// A failure worth surfacing to support, with enough context to find the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub tags: FailureTags,
    /// Stable error kind, e.g. `compute` or `quota_exceeded`.
    pub error_kind: String,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_params: Option<ConversionOptions>,
}

impl FailureReport {
    /// A failure of a decoded job, carrying its file, user and options.
    pub fn for_job(
        envelope: &JobEnvelope,
        action: &str,
        error_kind: &str,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            tags: FailureTags::consumer(action),
            error_kind: error_kind.to_string(),
            error_message: error_message.into(),
            file: Some(FileContext {
                id: envelope.file_id.clone(),
                name: envelope.file_name.clone(),
                size: envelope.file_size,
                duration: envelope.file_duration,
            }),
            user: Some(UserContext {
                id: envelope.user_id.clone(),
                email: envelope.email.clone(),
            }),
            conversion_params: Some(envelope.options.clone()),
        }
    }

    /// A message that could not be decoded. There is no job context to attach.
    pub fn for_poison_message(error_message: impl Into<String>) -> Self {
        Self {
            tags: FailureTags::consumer(ACTION_DECODE),
            error_kind: "decode".to_string(),
            error_message: error_message.into(),
            file: None,
            user: None,
            conversion_params: None,
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.id.as_str())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }
}

/// Telemetry event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },
    JobFailed(FailureReport),
}

impl TelemetryEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            TelemetryEvent::ServiceStarted { .. } => "service_started",
            TelemetryEvent::ServiceStopped { .. } => "service_stopped",
            TelemetryEvent::JobFailed(_) => "job_failed",
        }
    }

    pub fn file_id(&self) -> Option<&str> {
        match self {
            TelemetryEvent::JobFailed(report) => report.file_id(),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            TelemetryEvent::JobFailed(report) => report.user_id(),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<&str> {
        match self {
            TelemetryEvent::JobFailed(report) => Some(report.error_kind.as_str()),
            _ => None,
        }
    }
}

/// Stored telemetry record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub file_id: Option<String>,
    pub user_id: Option<String>,
    pub error_kind: Option<String>,
    pub data: TelemetryEvent,
}
