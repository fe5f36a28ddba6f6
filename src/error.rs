//! Error taxonomy for store and notification operations.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

/// Result type for store and notification operations.
pub type Result<T> = std::result::Result<T, EsError>;

/// Field-level validation messages, keyed by the offending field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub messages: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a validation message against a field.
    pub fn add(&mut self, field: &str, message: &str) {
        self.messages
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Errors that can occur during store and notification operations.
///
/// Conflicts and not-found are domain-significant and are surfaced to the
/// immediate caller untouched. Transient errors wrap backend failures with
/// no determinable outcome; the store performs no automatic retry.
#[derive(Debug, thiserror::Error)]
pub enum EsError {
    #[error("stream not found: {stream_id}")]
    NotFound { stream_id: Uuid },

    #[error("revision conflict on stream {stream_id} at revision {revision}")]
    Conflict { stream_id: Uuid, revision: u64 },

    #[error("stream already exists: {stream_id}")]
    DuplicateStream { stream_id: Uuid },

    #[error("validation failed")]
    Validation(ValidationErrors),

    #[error("malformed page key: {0}")]
    MalformedCursor(String),

    #[error("failed to decode notification: {reason}")]
    Decode { reason: String, raw: String },

    #[error("failed to acknowledge notification: {0}")]
    Acknowledge(String),

    #[error("corrupt stored record: {0}")]
    BadRecord(String),

    #[error("backend failure: {0}")]
    Transient(String),
}

impl EsError {
    /// True when retrying with a re-read stream revision could succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EsError::Conflict { .. } | EsError::DuplicateStream { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_accumulate_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("eventType", "required");
        errors.add("payload", "required");
        errors.add("payload", "must be an object");

        assert_eq!(errors.messages["eventType"], vec!["required"]);
        assert_eq!(errors.messages["payload"].len(), 2);
    }

    #[test]
    fn conflict_classification() {
        let id = Uuid::new_v4();
        assert!(EsError::Conflict { stream_id: id, revision: 2 }.is_conflict());
        assert!(EsError::DuplicateStream { stream_id: id }.is_conflict());
        assert!(!EsError::NotFound { stream_id: id }.is_conflict());
    }
}
