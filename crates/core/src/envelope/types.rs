//! Wire types for conversion jobs.

use serde::{Deserialize, Serialize};

/// Formatting options chosen by the user at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Maximum words per subtitle line.
    pub words_per_line: u32,
    /// Whether punctuation is kept in the generated text.
    #[serde(default)]
    pub punctuation: bool,
    /// Whether punctuation is allowed to force a line break.
    #[serde(default)]
    pub consider_punctuation: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            words_per_line: 8,
            punctuation: true,
            consider_punctuation: false,
        }
    }
}

/// The media file carried by a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilePayload {
    /// File bytes embedded in the message (base64 on the wire).
    Inline {
        #[serde(with = "base64_bytes")]
        content: Vec<u8>,
    },
    /// File already uploaded by the producer.
    Stored { location: String },
}

/// One conversion request as placed on the durable queue.
///
/// Envelopes are never modified after publishing; workers derive a
/// [`ConversionRequest`](crate::orchestrator::ConversionRequest) from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub file_id: String,
    pub user_id: String,
    /// Address notified when the subtitle file is ready.
    pub email: String,
    pub file_name: String,
    /// Declared size in bytes.
    pub file_size: u64,
    /// Declared media duration in seconds.
    pub file_duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub payload: FilePayload,
    pub options: ConversionOptions,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
