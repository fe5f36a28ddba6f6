//! Stream head record marshaling and conditional writes.
//!
//! The head record is the per-stream serialization point: creation requires
//! the head to be absent, and every advance requires the stored revision to
//! equal the revision the caller observed. Both conditions are evaluated by
//! the database, not in process.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue, Put, Update};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::keys::{self, ATTR_PK, ATTR_SK, HEAD_SORT_KEY};
use crate::error::{EsError, Result};
use crate::storage::cursor::format_ts;
use crate::types::Stream;

const RECORD_TYPE: &str = "stream";

/// Build the conditional put that creates a stream head at revision 1.
///
/// The condition fails when a head record already exists for this id.
pub fn put_new_stream(table_name: &str, stream: &Stream) -> Result<Put> {
    let mut item = keys::head_key(stream.stream_id);
    item.insert(
        "RecordType".to_string(),
        AttributeValue::S(RECORD_TYPE.to_string()),
    );
    item.insert(
        "StreamType".to_string(),
        AttributeValue::S(stream.stream_type.clone()),
    );
    item.insert(
        "StreamRevision".to_string(),
        AttributeValue::N(stream.revision.to_string()),
    );
    item.insert(
        "CreatedAt".to_string(),
        AttributeValue::S(format_ts(stream.created_at)),
    );
    item.insert(
        "UpdatedAt".to_string(),
        AttributeValue::S(format_ts(stream.updated_at)),
    );

    Put::builder()
        .table_name(table_name)
        .set_item(Some(item))
        .condition_expression("attribute_not_exists(PK)")
        .build()
        .map_err(|e| EsError::Transient(format!("failed to build stream put: {e}")))
}

/// Build the conditional update that advances a stream head by one revision.
///
/// The optimistic-concurrency gate: the update commits only while the stored
/// revision still equals `expected_prior`. Only the revision and `UpdatedAt`
/// move; the stream type is immutable after creation.
pub fn advance_stream(
    table_name: &str,
    stream_id: Uuid,
    expected_prior: u64,
    now: DateTime<Utc>,
) -> Result<Update> {
    Update::builder()
        .table_name(table_name)
        .set_key(Some(keys::head_key(stream_id)))
        .update_expression("SET #revision = :next, #updated_at = :updated_at")
        .condition_expression("#revision = :prior")
        .expression_attribute_names("#revision", "StreamRevision")
        .expression_attribute_names("#updated_at", "UpdatedAt")
        .expression_attribute_values(":prior", AttributeValue::N(expected_prior.to_string()))
        .expression_attribute_values(":next", AttributeValue::N((expected_prior + 1).to_string()))
        .expression_attribute_values(":updated_at", AttributeValue::S(format_ts(now)))
        .build()
        .map_err(|e| EsError::Transient(format!("failed to build stream update: {e}")))
}

/// Unmarshal a stored head record.
pub fn parse_stream(item: &HashMap<String, AttributeValue>) -> Result<Stream> {
    let sort_key = keys::get_u64(item, ATTR_SK)?;
    if sort_key != HEAD_SORT_KEY {
        return Err(EsError::BadRecord(format!(
            "expected stream head at sort key {HEAD_SORT_KEY}, got {sort_key}"
        )));
    }

    Ok(Stream {
        stream_id: keys::get_uuid(item, ATTR_PK)?,
        stream_type: keys::get_s(item, "StreamType")?.to_string(),
        revision: keys::get_u64(item, "StreamRevision")?,
        created_at: keys::get_ts(item, "CreatedAt")?,
        updated_at: keys::get_ts(item, "UpdatedAt")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stream() -> Stream {
        let now = Utc::now();
        Stream {
            stream_id: Uuid::new_v4(),
            stream_type: "order".to_string(),
            revision: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn new_stream_put_requires_absent_head() {
        let put = put_new_stream("es-table", &sample_stream()).unwrap();
        assert_eq!(put.condition_expression(), Some("attribute_not_exists(PK)"));
        assert_eq!(put.table_name(), "es-table");
        assert_eq!(
            put.item()[ATTR_SK],
            AttributeValue::N(HEAD_SORT_KEY.to_string())
        );
        assert_eq!(
            put.item()["StreamRevision"],
            AttributeValue::N("1".to_string())
        );
    }

    #[test]
    fn advance_gates_on_prior_revision() {
        let update = advance_stream("es-table", Uuid::new_v4(), 4, Utc::now()).unwrap();
        assert_eq!(update.condition_expression(), Some("#revision = :prior"));
        assert_eq!(
            update.expression_attribute_values().unwrap()[":prior"],
            AttributeValue::N("4".to_string())
        );
        assert_eq!(
            update.expression_attribute_values().unwrap()[":next"],
            AttributeValue::N("5".to_string())
        );
    }

    #[test]
    fn advance_leaves_creation_time_alone() {
        let update = advance_stream("es-table", Uuid::new_v4(), 4, Utc::now()).unwrap();
        assert!(!update.update_expression().contains("CreatedAt"));
        assert!(!update.condition_expression().unwrap().contains("CreatedAt"));
        assert!(!update
            .expression_attribute_names()
            .unwrap()
            .values()
            .any(|attr| attr == "CreatedAt"));
    }

    #[test]
    fn head_round_trips_through_put_item() {
        let stream = sample_stream();
        let put = put_new_stream("es-table", &stream).unwrap();
        let restored = parse_stream(put.item()).unwrap();
        assert_eq!(restored, stream);
    }

    #[test]
    fn parse_rejects_event_records() {
        let stream = sample_stream();
        let put = put_new_stream("es-table", &stream).unwrap();
        let mut item = put.item().clone();
        item.insert(ATTR_SK.to_string(), AttributeValue::N("3".to_string()));

        assert!(matches!(parse_stream(&item), Err(EsError::BadRecord(_))));
    }
}
