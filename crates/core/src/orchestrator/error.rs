//! Error types for conversions and jobs.

use thiserror::Error;

use crate::envelope::DecodeError;
use crate::storage::StorageError;
use crate::usage::UsageError;

/// Errors from a single conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The input could not be staged for the compute service.
    #[error("Failed to stage input: {0}")]
    Staging(#[source] StorageError),

    /// The compute call failed or returned nothing usable.
    #[error("Compute failed: {0}")]
    Compute(String),

    /// The subtitle or its history record could not be saved.
    #[error("Failed to persist result: {0}")]
    Persistence(String),
}

impl ConversionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ConversionError::Staging(_) => "staging",
            ConversionError::Compute(_) => "compute",
            ConversionError::Persistence(_) => "persistence",
        }
    }
}

/// Errors from handling one job.
#[derive(Debug, Error)]
pub enum JobError {
    /// The message is not a valid envelope.
    #[error("Invalid job envelope: {0}")]
    Decode(#[from] DecodeError),

    /// The user's plan or usage could not be looked up.
    #[error("Quota lookup failed: {0}")]
    QuotaLookup(#[source] UsageError),

    /// The job would take the user over their monthly limit.
    #[error("Monthly limit exceeded for user {user_id}: {requested_secs}s requested")]
    QuotaExceeded { user_id: String, requested_secs: f64 },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl JobError {
    /// Stable name used in logs, metric labels and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Decode(_) => "decode",
            JobError::QuotaLookup(_) => "quota_lookup",
            JobError::QuotaExceeded { .. } => "quota_exceeded",
            JobError::Conversion(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            JobError::QuotaExceeded {
                user_id: "u".to_string(),
                requested_secs: 1.0
            }
            .kind(),
            "quota_exceeded"
        );
        assert_eq!(
            JobError::QuotaLookup(UsageError::UserNotFound("u".to_string())).kind(),
            "quota_lookup"
        );
        assert_eq!(
            JobError::from(ConversionError::Compute("x".to_string())).kind(),
            "compute"
        );
        assert_eq!(
            JobError::from(ConversionError::Persistence("x".to_string())).kind(),
            "persistence"
        );
        assert_eq!(
            JobError::from(DecodeError::Malformed("eof".to_string())).kind(),
            "decode"
        );
    }
}
