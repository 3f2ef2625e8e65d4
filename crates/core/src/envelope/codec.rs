//! Encoding and validation of job envelopes.

use thiserror::Error;

use super::{FilePayload, JobEnvelope};

/// Upper bound accepted for `words_per_line`.
pub const MAX_WORDS_PER_LINE: u32 = 50;

/// A message that cannot be turned into a valid envelope.
///
/// Decode failures are never retried: the same bytes would fail again.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON for an envelope.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// Envelope parsed but violates an invariant.
    #[error("Invalid envelope field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl DecodeError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

impl JobEnvelope {
    /// Parse and validate an envelope from raw message bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let envelope: JobEnvelope =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        envelope.validate()?;
        Ok(envelope)
    }

    /// Serialize the envelope for publishing.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Check the invariants a producer must uphold.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.file_id.trim().is_empty() {
            return Err(DecodeError::invalid("file_id", "must not be empty"));
        }
        if self.user_id.trim().is_empty() {
            return Err(DecodeError::invalid("user_id", "must not be empty"));
        }
        if !self.email.contains('@') {
            return Err(DecodeError::invalid("email", "not an email address"));
        }
        if self.file_name.trim().is_empty() {
            return Err(DecodeError::invalid("file_name", "must not be empty"));
        }
        if self.file_name.contains('/') || self.file_name.contains('\\') {
            return Err(DecodeError::invalid("file_name", "must not contain path separators"));
        }
        if self.file_name == "." || self.file_name == ".." {
            return Err(DecodeError::invalid("file_name", "must name a file"));
        }
        if !self.file_duration.is_finite() || self.file_duration < 0.0 {
            return Err(DecodeError::invalid(
                "file_duration",
                format!("must be a non-negative number, got {}", self.file_duration),
            ));
        }
        if self.options.words_per_line == 0 || self.options.words_per_line > MAX_WORDS_PER_LINE {
            return Err(DecodeError::invalid(
                "options.words_per_line",
                format!("must be between 1 and {}", MAX_WORDS_PER_LINE),
            ));
        }

        match &self.payload {
            FilePayload::Inline { content } => {
                if content.len() as u64 != self.file_size {
                    return Err(DecodeError::invalid(
                        "file_size",
                        format!(
                            "declared {} bytes but payload has {}",
                            self.file_size,
                            content.len()
                        ),
                    ));
                }
            }
            FilePayload::Stored { location } => {
                if location.trim().is_empty() {
                    return Err(DecodeError::invalid("payload.location", "must not be empty"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ConversionOptions;

    fn envelope() -> JobEnvelope {
        JobEnvelope {
            file_id: "f-1".to_string(),
            user_id: "u-1".to_string(),
            email: "user@example.com".to_string(),
            file_name: "talk.mp4".to_string(),
            file_size: 4,
            file_duration: 600.0,
            content_type: Some("video/mp4".to_string()),
            payload: FilePayload::Inline {
                content: vec![1, 2, 3, 4],
            },
            options: ConversionOptions::default(),
        }
    }

    #[test]
    fn test_decode_encoded_envelope() {
        let original = envelope();
        let bytes = original.encode().unwrap();
        let decoded = JobEnvelope::decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_inline_content_is_base64_on_the_wire() {
        let json: serde_json::Value =
            serde_json::from_slice(&envelope().encode().unwrap()).unwrap();
        assert_eq!(json["payload"]["kind"], "inline");
        assert_eq!(json["payload"]["content"], "AQIDBA==");
    }

    #[test]
    fn test_decode_stored_payload() {
        let json = r#"{
            "file_id": "f-2",
            "user_id": "u-2",
            "email": "a@b.co",
            "file_name": "lecture.mp3",
            "file_size": 1048576,
            "file_duration": 3600.5,
            "payload": {"kind": "stored", "location": "s3://uploads/u-2/lecture.mp3"},
            "options": {"words_per_line": 6, "punctuation": false, "consider_punctuation": true}
        }"#;
        let decoded = JobEnvelope::decode(json.as_bytes()).unwrap();
        assert!(matches!(decoded.payload, FilePayload::Stored { .. }));
        assert!(decoded.options.consider_punctuation);
        assert!(decoded.content_type.is_none());
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        let err = JobEnvelope::decode(b"not json").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_decode_missing_field_is_malformed() {
        let err = JobEnvelope::decode(br#"{"file_id": "f"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_decode_bad_base64_is_malformed() {
        let mut json: serde_json::Value =
            serde_json::from_slice(&envelope().encode().unwrap()).unwrap();
        json["payload"]["content"] = serde_json::Value::String("***".to_string());
        let err = JobEnvelope::decode(json.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut env = envelope();
        env.file_size = 10;
        let err = JobEnvelope::decode(&env.encode().unwrap()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidField { field: "file_size", .. }));
    }

    #[test]
    fn test_field_invariants() {
        let cases: Vec<(&str, Box<dyn Fn(&mut JobEnvelope)>)> = vec![
            ("file_id", Box::new(|e| e.file_id = " ".to_string())),
            ("user_id", Box::new(|e| e.user_id = String::new())),
            ("email", Box::new(|e| e.email = "nobody".to_string())),
            ("file_name", Box::new(|e| e.file_name = "../etc/passwd".to_string())),
            ("file_duration", Box::new(|e| e.file_duration = -3.0)),
            ("options.words_per_line", Box::new(|e| e.options.words_per_line = 0)),
            ("options.words_per_line", Box::new(|e| e.options.words_per_line = 51)),
        ];

        for (expected_field, mutate) in cases {
            let mut env = envelope();
            mutate(&mut env);
            match env.validate() {
                Err(DecodeError::InvalidField { field, .. }) => assert_eq!(field, expected_field),
                other => panic!("expected invalid {}, got {:?}", expected_field, other),
            }
        }
    }

    #[test]
    fn test_dot_file_names_are_poison() {
        for name in [".", ".."] {
            let mut env = envelope();
            env.file_name = name.to_string();
            let err = JobEnvelope::decode(&env.encode().unwrap()).unwrap_err();
            assert!(
                matches!(err, DecodeError::InvalidField { field: "file_name", .. }),
                "{:?} accepted",
                name
            );
        }

        let mut env = envelope();
        env.file_name = ".hidden.mp4".to_string();
        assert!(JobEnvelope::decode(&env.encode().unwrap()).is_ok());
    }
}
