//! Configuration for the external compute service.

use serde::{Deserialize, Serialize};

/// Where and how to invoke the subtitle generation function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Base URL of the function invocation API.
    pub endpoint: String,

    /// Name of the function that produces subtitles.
    pub function_name: String,

    /// Bearer token sent with each invocation.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-invocation timeout. Transcription of long media is slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    900
}
