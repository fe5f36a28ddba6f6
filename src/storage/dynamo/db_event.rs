//! Event record marshaling and queries.

use std::collections::HashMap;

use aws_sdk_dynamodb::operation::query::builders::QueryFluentBuilder;
use aws_sdk_dynamodb::types::{AttributeValue, Put};
use aws_sdk_dynamodb::Client;
use uuid::Uuid;

use super::keys::{self, ATTR_PK, ATTR_SK};
use crate::error::{EsError, Result};
use crate::storage::cursor::format_ts;
use crate::types::Event;

const RECORD_TYPE: &str = "event";

/// Build the conditional put that inserts an event at `(stream_id, revision)`.
///
/// The not-exists condition is a duplicate guard independent of the stream
/// revision gate.
pub fn put_event(table_name: &str, event: &Event) -> Result<Put> {
    let payload = serde_json::to_string(&event.payload)
        .map_err(|e| EsError::Transient(format!("failed to serialize event payload: {e}")))?;

    let mut item = keys::event_key(event.stream_id, event.revision);
    item.insert(
        "RecordType".to_string(),
        AttributeValue::S(RECORD_TYPE.to_string()),
    );
    item.insert(
        "EventType".to_string(),
        AttributeValue::S(event.event_type.clone()),
    );
    item.insert("Payload".to_string(), AttributeValue::S(payload));
    item.insert(
        "CreatedAt".to_string(),
        AttributeValue::S(format_ts(event.created_at)),
    );

    Put::builder()
        .table_name(table_name)
        .set_item(Some(item))
        .condition_expression("attribute_not_exists(PK) AND attribute_not_exists(SK)")
        .build()
        .map_err(|e| EsError::Transient(format!("failed to build event put: {e}")))
}

/// Build the forward scan over a stream's events strictly after
/// `after_revision`.
///
/// The exclusive start key doubles as the head-record filter: starting after
/// sort key `after_revision` (0 for the beginning) skips the head at sort
/// key 0.
pub fn events_query(
    client: &Client,
    table_name: &str,
    stream_id: Uuid,
    after_revision: u64,
    limit: i32,
) -> QueryFluentBuilder {
    client
        .query()
        .table_name(table_name)
        .key_condition_expression("#pk = :pk")
        .expression_attribute_names("#pk", ATTR_PK)
        .expression_attribute_values(":pk", AttributeValue::S(stream_id.to_string()))
        .set_exclusive_start_key(Some(keys::event_key(stream_id, after_revision)))
        .limit(limit)
}

/// Unmarshal a stored event record.
pub fn parse_event(item: &HashMap<String, AttributeValue>) -> Result<Event> {
    let payload = serde_json::from_str(keys::get_s(item, "Payload")?)
        .map_err(|e| EsError::BadRecord(format!("invalid event payload: {e}")))?;

    Ok(Event {
        stream_id: keys::get_uuid(item, ATTR_PK)?,
        revision: keys::get_u64(item, ATTR_SK)?,
        event_type: keys::get_s(item, "EventType")?.to_string(),
        payload,
        created_at: keys::get_ts(item, "CreatedAt")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_event() -> Event {
        Event {
            stream_id: Uuid::new_v4(),
            revision: 2,
            event_type: "shipped".to_string(),
            payload: serde_json::json!({"carrier": "dhl", "parcels": 2}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn event_put_guards_against_duplicates() {
        let put = put_event("es-table", &sample_event()).unwrap();
        assert_eq!(
            put.condition_expression(),
            Some("attribute_not_exists(PK) AND attribute_not_exists(SK)")
        );
        assert_eq!(put.item()[ATTR_SK], AttributeValue::N("2".to_string()));
    }

    #[test]
    fn event_round_trips_through_put_item() {
        let event = sample_event();
        let put = put_event("es-table", &event).unwrap();
        let restored = parse_event(put.item()).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn payload_is_stored_verbatim_as_json_text() {
        let event = sample_event();
        let put = put_event("es-table", &event).unwrap();
        let stored = put.item()["Payload"].as_s().unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(stored).unwrap(),
            event.payload
        );
    }
}
