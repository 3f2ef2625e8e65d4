//! Testing utilities and mock implementations.
//!
//! Mocks for every collaborator trait, so the whole pipeline can run in a
//! test without a broker, storage, compute function or email API.
//!
//! # Example
//!
//! ```rust,ignore
//! use autosrt_core::testing::{fixtures, MockComputeService, MockObjectStore, MockQueue};
//!
//! let queue = MockQueue::new();
//! let compute = MockComputeService::new();
//! compute.set_response(fixtures::failed_response(500, "decoder crashed")).await;
//!
//! queue.publish(&fixtures::inline_envelope("f1", "u1", 60.0)).await?;
//! ```

mod mock_compute;
mod mock_notifier;
mod mock_object_store;
mod mock_queue;

pub use mock_compute::{MockComputeService, RecordedInvocation};
pub use mock_notifier::{MockNotifier, RecordedNotification};
pub use mock_object_store::MockObjectStore;
pub use mock_queue::{MockQueue, RecordedSettlement, Settlement};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::compute::ComputeResponse;
    use crate::envelope::{ConversionOptions, FilePayload, JobEnvelope};

    /// Bytes used as the media content of inline fixtures.
    pub const MEDIA_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42fake media content";

    pub const SAMPLE_SRT: &str =
        "1\n00:00:00,000 --> 00:00:02,500\nHello and welcome\n\n2\n00:00:02,500 --> 00:00:05,000\nto the lecture\n";

    /// An envelope carrying `lecture.mp4` inline.
    pub fn inline_envelope(file_id: &str, user_id: &str, duration_secs: f64) -> JobEnvelope {
        JobEnvelope {
            file_id: file_id.to_string(),
            user_id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            file_name: "lecture.mp4".to_string(),
            file_size: MEDIA_BYTES.len() as u64,
            file_duration: duration_secs,
            content_type: Some("video/mp4".to_string()),
            payload: FilePayload::Inline {
                content: MEDIA_BYTES.to_vec(),
            },
            options: ConversionOptions::default(),
        }
    }

    /// An envelope pointing at an already uploaded file.
    ///
    /// The file name is the last path segment of `location`.
    pub fn stored_envelope(
        file_id: &str,
        user_id: &str,
        location: &str,
        duration_secs: f64,
    ) -> JobEnvelope {
        let file_name = location.rsplit('/').next().unwrap_or(location).to_string();
        JobEnvelope {
            file_id: file_id.to_string(),
            user_id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            file_name,
            file_size: 1024,
            file_duration: duration_secs,
            content_type: None,
            payload: FilePayload::Stored {
                location: location.to_string(),
            },
            options: ConversionOptions::default(),
        }
    }

    /// Successful response with the subtitle inline.
    pub fn subtitle_response() -> ComputeResponse {
        ComputeResponse {
            status_code: 200,
            artifact_location: None,
            subtitle: Some(SAMPLE_SRT.to_string()),
            message: None,
        }
    }

    /// Successful response pointing at a subtitle the function stored itself.
    pub fn artifact_response(location: &str) -> ComputeResponse {
        ComputeResponse {
            status_code: 200,
            artifact_location: Some(location.to_string()),
            subtitle: None,
            message: None,
        }
    }

    /// A function-level failure.
    pub fn failed_response(status_code: u16, message: &str) -> ComputeResponse {
        ComputeResponse {
            status_code,
            artifact_location: None,
            subtitle: None,
            message: Some(message.to_string()),
        }
    }
}
