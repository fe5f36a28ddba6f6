//! Stream-update notifications.
//!
//! Notifications arrive wrapped twice: the queue message body is an SNS
//! delivery envelope whose `Message` field holds the JSON notification
//! published by the store's change stream. Delivery is at-least-once, so
//! duplicates of the same `(stream_id, stream_revision)` must be tolerated.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::error::EsError;

/// A stream advanced to `stream_revision`.
///
/// The receipt handle is a delivery detail used only for acknowledgment; it
/// is excluded from equality and hashing so redelivered duplicates compare
/// equal.
#[derive(Debug, Clone)]
pub struct EsNotification {
    pub stream_id: Uuid,
    pub stream_type: String,
    pub stream_revision: u64,
    receipt_handle: String,
}

/// Outer SNS delivery envelope; only the inner message is of interest.
#[derive(Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "Message")]
    message: String,
}

/// Inner notification payload as published by the change stream.
#[derive(Deserialize)]
struct WireNotification {
    #[serde(rename = "StreamId")]
    stream_id: Uuid,
    #[serde(rename = "StreamType")]
    stream_type: String,
    #[serde(rename = "StreamRevision", deserialize_with = "u64_from_string")]
    stream_revision: u64,
}

/// The revision travels as a stringified number.
fn u64_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl EsNotification {
    /// Decode a raw queue message body into a notification.
    ///
    /// Parses the outer envelope, then the inner payload. Either failure
    /// yields [`EsError::Decode`] carrying the raw body for diagnostics.
    pub fn decode(body: &str, receipt_handle: impl Into<String>) -> Result<Self, EsError> {
        let envelope: SnsEnvelope = serde_json::from_str(body).map_err(|e| EsError::Decode {
            reason: format!("invalid delivery envelope: {e}"),
            raw: body.to_string(),
        })?;

        let wire: WireNotification =
            serde_json::from_str(&envelope.message).map_err(|e| EsError::Decode {
                reason: format!("invalid notification payload: {e}"),
                raw: body.to_string(),
            })?;

        Ok(Self {
            stream_id: wire.stream_id,
            stream_type: wire.stream_type,
            stream_revision: wire.stream_revision,
            receipt_handle: receipt_handle.into(),
        })
    }

    /// The delivery handle needed to acknowledge this notification.
    pub fn receipt_handle(&self) -> &str {
        &self.receipt_handle
    }
}

impl PartialEq for EsNotification {
    fn eq(&self, other: &Self) -> bool {
        self.stream_id == other.stream_id
            && self.stream_type == other.stream_type
            && self.stream_revision == other.stream_revision
    }
}

impl Eq for EsNotification {}

impl Hash for EsNotification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stream_id.hash(state);
        self.stream_type.hash(state);
        self.stream_revision.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_for(stream_id: Uuid, stream_type: &str, revision: u64) -> String {
        let inner = serde_json::json!({
            "StreamId": stream_id,
            "StreamType": stream_type,
            "StreamRevision": revision.to_string(),
        });
        serde_json::json!({ "Message": inner.to_string() }).to_string()
    }

    #[test]
    fn decodes_wrapped_notification() {
        let id = Uuid::new_v4();
        let body = body_for(id, "order", 3);

        let n = EsNotification::decode(&body, "receipt-1").unwrap();
        assert_eq!(n.stream_id, id);
        assert_eq!(n.stream_type, "order");
        assert_eq!(n.stream_revision, 3);
        assert_eq!(n.receipt_handle(), "receipt-1");
    }

    #[test]
    fn rejects_invalid_envelope() {
        let err = EsNotification::decode("not json", "r").unwrap_err();
        match err {
            EsError::Decode { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_inner_payload() {
        let body = serde_json::json!({ "Message": "{\"StreamId\": 42}" }).to_string();
        let err = EsNotification::decode(&body, "r").unwrap_err();
        assert!(matches!(err, EsError::Decode { .. }));
    }

    #[test]
    fn rejects_non_numeric_revision() {
        let inner = serde_json::json!({
            "StreamId": Uuid::new_v4(),
            "StreamType": "order",
            "StreamRevision": "three",
        });
        let body = serde_json::json!({ "Message": inner.to_string() }).to_string();
        assert!(EsNotification::decode(&body, "r").is_err());
    }

    #[test]
    fn equality_ignores_receipt_handle() {
        let id = Uuid::new_v4();
        let a = EsNotification::decode(&body_for(id, "order", 2), "receipt-a").unwrap();
        let b = EsNotification::decode(&body_for(id, "order", 2), "receipt-b").unwrap();

        assert_eq!(a, b);

        let mut seen = std::collections::HashSet::new();
        seen.insert(a);
        assert!(seen.contains(&b));
    }
}
