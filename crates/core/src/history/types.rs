//! History record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome stored alongside a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Completed,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for HistoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(HistoryStatus::Completed),
            other => Err(format!("unknown history status: {}", other)),
        }
    }
}

/// A completed conversion, as shown in the user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub user_id: String,
    pub file_id: String,
    pub file_name: String,
    /// Processed duration in seconds.
    pub duration_secs: f64,
    /// Where the produced subtitle can be fetched.
    pub artifact_location: String,
    pub status: HistoryStatus,
    pub created_at: DateTime<Utc>,
}
