//! Orchestrator types.

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::envelope::{ConversionOptions, FilePayload, JobEnvelope};

/// The media to convert.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSource {
    /// File bytes that still need staging.
    Bytes(Bytes),
    /// File already uploaded to this location.
    Stored(String),
}

/// A conversion, derived from one job envelope.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub user_id: String,
    pub file_id: String,
    pub file_name: String,
    pub options: ConversionOptions,
    pub payload: PayloadSource,
    /// Declared size in bytes.
    pub file_size: u64,
    /// Declared duration in seconds.
    pub file_duration: f64,
}

impl ConversionRequest {
    pub fn from_envelope(envelope: &JobEnvelope) -> Self {
        let payload = match &envelope.payload {
            FilePayload::Inline { content } => PayloadSource::Bytes(Bytes::copy_from_slice(content)),
            FilePayload::Stored { location } => PayloadSource::Stored(location.clone()),
        };

        Self {
            user_id: envelope.user_id.clone(),
            file_id: envelope.file_id.clone(),
            file_name: envelope.file_name.clone(),
            options: envelope.options.clone(),
            payload,
            file_size: envelope.file_size,
            file_duration: envelope.file_duration,
        }
    }

    /// Object key the input is staged under.
    pub fn input_key(&self) -> String {
        format!("{}/{}/{}", self.user_id, self.file_id, self.file_name)
    }

    /// Object key an inline subtitle is persisted under.
    ///
    /// Never equal to [`input_key`](Self::input_key), so an input that is
    /// itself named `*.srt` is not overwritten by its subtitles.
    pub fn subtitle_key(&self) -> String {
        let stem = std::path::Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.file_name);
        let key = format!("{}/{}/{}.srt", self.user_id, self.file_id, stem);
        if key == self.input_key() {
            format!("{}/{}/{}.generated.srt", self.user_id, self.file_id, stem)
        } else {
            key
        }
    }
}

/// Status reported by the compute function for a completed conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionStatus {
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A completed conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Where the subtitle file can be fetched.
    pub artifact_location: String,
    /// Where the input media was staged. `None` when an earlier delivery
    /// already completed this conversion.
    pub staged_location: Option<String>,
    pub status: ConversionStatus,
    pub elapsed: Duration,
    /// The history record for this (user, file) pair existed before this
    /// call, so usage for it has already been counted.
    pub already_recorded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_from_inline_envelope() {
        let envelope = fixtures::inline_envelope("f1", "u1", 90.0);
        let request = ConversionRequest::from_envelope(&envelope);

        assert_eq!(request.input_key(), "u1/f1/lecture.mp4");
        assert_eq!(request.subtitle_key(), "u1/f1/lecture.srt");
        assert!(matches!(request.payload, PayloadSource::Bytes(ref b) if b.len() as u64 == envelope.file_size));
        assert_eq!(request.file_duration, 90.0);
    }

    #[test]
    fn test_from_stored_envelope() {
        let envelope = fixtures::stored_envelope("f2", "u1", "file:///objects/u1/f2/a.wav", 10.0);
        let request = ConversionRequest::from_envelope(&envelope);
        assert_eq!(
            request.payload,
            PayloadSource::Stored("file:///objects/u1/f2/a.wav".to_string())
        );
    }

    #[test]
    fn test_subtitle_key_without_extension() {
        let mut envelope = fixtures::inline_envelope("f1", "u1", 1.0);
        envelope.file_name = "recording".to_string();
        let request = ConversionRequest::from_envelope(&envelope);
        assert_eq!(request.subtitle_key(), "u1/f1/recording.srt");
    }

    #[test]
    fn test_subtitle_key_differs_from_srt_input() {
        let mut envelope = fixtures::inline_envelope("f1", "u1", 1.0);
        envelope.file_name = "x.srt".to_string();
        let request = ConversionRequest::from_envelope(&envelope);

        assert_eq!(request.input_key(), "u1/f1/x.srt");
        assert_eq!(request.subtitle_key(), "u1/f1/x.generated.srt");
    }
}
