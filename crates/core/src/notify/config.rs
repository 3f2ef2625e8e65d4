//! Configuration for completion notifications.

use serde::{Deserialize, Serialize};

/// Email API used to tell users their subtitles are ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Endpoint accepting `POST` of a JSON email.
    pub api_url: String,
    pub api_key: String,
    /// Sender, e.g. `AutoSRT <noreply@example.com>`.
    pub from_address: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}
