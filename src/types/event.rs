//! Event records and event paging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable event record, identified by `(stream_id, revision)`.
///
/// Revisions are a dense, gapless sequence starting at 1 within a stream.
/// Once written an event is never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub stream_id: Uuid,
    pub revision: u64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied input for a create or append operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl NewEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// Materialize this input as the event at `revision` of `stream_id`.
    pub(crate) fn into_event(
        self,
        stream_id: Uuid,
        revision: u64,
        created_at: DateTime<Utc>,
    ) -> Event {
        Event {
            stream_id,
            revision,
            event_type: self.event_type,
            payload: self.payload,
            created_at,
        }
    }
}

/// One page of a stream's events, ordered by ascending revision.
///
/// Callers page by re-querying with `after_revision = last_evaluated_revision`
/// until `has_more` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub events: Vec<Event>,
    pub has_more: bool,
    pub last_evaluated_revision: u64,
}
