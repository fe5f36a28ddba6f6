//! Key construction and attribute access for the single-table layout.
//!
//! Both record kinds share one namespace keyed by stream id: the head record
//! lives at sort key 0 (never a valid event revision) and each event at its
//! revision. A secondary index over head records orders them by
//! `(StreamType, UpdatedAt)` for listings.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::super::cursor::{format_ts, parse_ts, StreamPageKey};
use crate::error::{EsError, Result};

/// Partition key attribute.
pub const ATTR_PK: &str = "PK";
/// Sort key attribute.
pub const ATTR_SK: &str = "SK";
/// Sort key sentinel for the stream head record.
pub const HEAD_SORT_KEY: u64 = 0;
/// Secondary index over head records, keyed by `(StreamType, UpdatedAt)`.
pub const STREAM_INDEX: &str = "StreamIndex";

/// Storage key of the event at `(stream_id, revision)`.
pub fn event_key(stream_id: Uuid, revision: u64) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (ATTR_PK.to_string(), AttributeValue::S(stream_id.to_string())),
        (ATTR_SK.to_string(), AttributeValue::N(revision.to_string())),
    ])
}

/// Storage key of the stream head record.
pub fn head_key(stream_id: Uuid) -> HashMap<String, AttributeValue> {
    event_key(stream_id, HEAD_SORT_KEY)
}

impl StreamPageKey {
    /// Rebuild the index position a listing query stopped at.
    pub(crate) fn to_exclusive_start_key(&self) -> HashMap<String, AttributeValue> {
        let mut key = head_key(self.stream_id);
        key.insert(
            "StreamType".to_string(),
            AttributeValue::S(self.stream_type.clone()),
        );
        key.insert(
            "UpdatedAt".to_string(),
            AttributeValue::S(format_ts(self.updated_at)),
        );
        key
    }

    /// Capture the index position a listing query stopped at.
    pub(crate) fn from_last_evaluated_key(
        key: &HashMap<String, AttributeValue>,
    ) -> Result<Self> {
        Ok(Self {
            stream_id: get_uuid(key, ATTR_PK)?,
            stream_type: get_s(key, "StreamType")?.to_string(),
            updated_at: get_ts(key, "UpdatedAt")?,
        })
    }
}

pub fn get_s<'a>(item: &'a HashMap<String, AttributeValue>, name: &str) -> Result<&'a str> {
    item.get(name)
        .and_then(|av| av.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| EsError::BadRecord(format!("missing string attribute {name}")))
}

pub fn get_u64(item: &HashMap<String, AttributeValue>, name: &str) -> Result<u64> {
    item.get(name)
        .and_then(|av| av.as_n().ok())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| EsError::BadRecord(format!("missing numeric attribute {name}")))
}

pub fn get_uuid(item: &HashMap<String, AttributeValue>, name: &str) -> Result<Uuid> {
    Uuid::parse_str(get_s(item, name)?)
        .map_err(|e| EsError::BadRecord(format!("invalid uuid in attribute {name}: {e}")))
}

pub fn get_ts(item: &HashMap<String, AttributeValue>, name: &str) -> Result<DateTime<Utc>> {
    parse_ts(get_s(item, name)?)
        .ok_or_else(|| EsError::BadRecord(format!("invalid timestamp in attribute {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_key_uses_revision_sentinel() {
        let id = Uuid::new_v4();
        let head = head_key(id);
        assert_eq!(head[ATTR_SK], AttributeValue::N("0".to_string()));
        assert_eq!(head[ATTR_PK], AttributeValue::S(id.to_string()));
    }

    #[test]
    fn event_keys_never_collide_with_head() {
        let id = Uuid::new_v4();
        for revision in 1..=3u64 {
            assert_ne!(event_key(id, revision), head_key(id));
        }
    }

    #[test]
    fn distinct_pairs_produce_distinct_keys() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_ne!(event_key(a, 1), event_key(b, 1));
        assert_ne!(event_key(a, 1), event_key(a, 2));
    }

    #[test]
    fn page_key_survives_attribute_round_trip() {
        let key = StreamPageKey {
            stream_id: Uuid::new_v4(),
            stream_type: "order".to_string(),
            updated_at: Utc::now(),
        };

        let restored =
            StreamPageKey::from_last_evaluated_key(&key.to_exclusive_start_key()).unwrap();
        assert_eq!(restored, key);
    }

    #[test]
    fn attribute_getters_report_missing_fields() {
        let item = HashMap::new();
        assert!(matches!(get_s(&item, "StreamType"), Err(EsError::BadRecord(_))));
        assert!(matches!(get_u64(&item, "SK"), Err(EsError::BadRecord(_))));
    }
}
