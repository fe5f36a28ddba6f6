//! Input validation for data crossing the store boundary.
//!
//! Failures carry a field -> messages map so the caller can report every
//! problem at once.

use crate::error::{EsError, Result, ValidationErrors};
use crate::types::NewEvent;

/// Maximum stream type length.
pub const MAX_STREAM_TYPE_LENGTH: usize = 128;

/// Error message constants for validation failures.
pub mod errmsg {
    pub const REQUIRED: &str = "required";
    pub const TOO_LONG: &str = "exceeds maximum length";
    pub const RESERVED_DELIMITER: &str = "must not contain '|'";
}

/// Validate a caller-supplied event.
///
/// `event_type` must be non-empty; `payload` is opaque but must be present
/// (JSON null is treated as missing).
pub fn new_event(event: &NewEvent) -> Result<()> {
    let mut errors = ValidationErrors::new();

    if event.event_type.trim().is_empty() {
        errors.add("eventType", errmsg::REQUIRED);
    }
    if event.payload.is_null() {
        errors.add("payload", errmsg::REQUIRED);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(EsError::Validation(errors))
    }
}

/// Validate a stream type.
///
/// The `|` character is reserved: it delimits fields inside encoded page
/// keys, so admitting it would make cursors ambiguous.
pub fn stream_type(value: &str) -> Result<()> {
    let mut errors = ValidationErrors::new();

    if value.trim().is_empty() {
        errors.add("streamType", errmsg::REQUIRED);
    }
    if value.len() > MAX_STREAM_TYPE_LENGTH {
        errors.add("streamType", errmsg::TOO_LONG);
    }
    if value.contains('|') {
        errors.add("streamType", errmsg::RESERVED_DELIMITER);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(EsError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_new_event() {
        let event = NewEvent::new("created", serde_json::json!({"qty": 1}));
        assert!(new_event(&event).is_ok());
    }

    #[test]
    fn rejects_empty_event_type_and_null_payload() {
        let event = NewEvent::new("", serde_json::Value::Null);
        let err = new_event(&event).unwrap_err();
        match err {
            EsError::Validation(errors) => {
                assert_eq!(errors.messages["eventType"], vec![errmsg::REQUIRED]);
                assert_eq!(errors.messages["payload"], vec![errmsg::REQUIRED]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_stream_type_with_delimiter() {
        let err = stream_type("order|archived").unwrap_err();
        match err {
            EsError::Validation(errors) => {
                assert_eq!(errors.messages["streamType"], vec![errmsg::RESERVED_DELIMITER]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_stream_type() {
        assert!(stream_type("  ").is_err());
        assert!(stream_type("order").is_ok());
    }
}
