//! Request and response types for compute invocations.

use serde::{Deserialize, Serialize};

use crate::envelope::ConversionOptions;

/// Input handed to the subtitle generation function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeRequest {
    /// Location of the staged media.
    pub location: String,
    pub file_name: String,
    pub options: ConversionOptions,
}

/// Output of the subtitle generation function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeResponse {
    pub status_code: u16,

    /// Where the function stored the subtitle, when it stored it itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_location: Option<String>,

    /// Subtitle text returned inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComputeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// A response that neither points at an artifact nor carries one is unusable.
    pub fn has_output(&self) -> bool {
        self.artifact_location
            .as_deref()
            .is_some_and(|l| !l.is_empty())
            || self.subtitle.is_some()
    }
}
