//! Mock event store for testing.
//!
//! Enforces the same conditions the DynamoDB backend delegates to the
//! database: head-absent on create, revision gate on append, duplicate-event
//! guard, and both records committed under one write lock so no partial
//! state is observable. Protocol properties are testable against it without
//! a backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{EsError, Result, ValidationErrors};
use crate::interfaces::EventStore;
use crate::storage::cursor::StreamPageKey;
use crate::types::{Event, EventPage, NewEvent, Stream, StreamPage};
use crate::validate;

struct StreamRecord {
    head: Stream,
    events: Vec<Event>,
}

/// In-memory event store with the same write gating as the real backend.
pub struct MockEventStore {
    streams: RwLock<HashMap<Uuid, StreamRecord>>,
    page_size: usize,
}

impl Default for MockEventStore {
    fn default() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            page_size: 100,
        }
    }
}

impl MockEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of items returned per query page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Create a stream under a caller-chosen id.
    ///
    /// Exists to exercise the duplicate-creation path, which is practically
    /// unreachable through `create_stream` with fresh ids.
    pub async fn create_stream_with_id(
        &self,
        stream_id: Uuid,
        stream_type: &str,
        initial_event: NewEvent,
    ) -> Result<Stream> {
        validate::stream_type(stream_type)?;
        validate::new_event(&initial_event)?;

        let now = Utc::now();
        let head = Stream {
            stream_id,
            stream_type: stream_type.to_string(),
            revision: 1,
            created_at: now,
            updated_at: now,
        };

        let mut streams = self.streams.write().await;
        if streams.contains_key(&stream_id) {
            return Err(EsError::DuplicateStream { stream_id });
        }

        let event = initial_event.into_event(stream_id, 1, now);
        streams.insert(
            stream_id,
            StreamRecord {
                head: head.clone(),
                events: vec![event],
            },
        );

        Ok(head)
    }
}

#[async_trait]
impl EventStore for MockEventStore {
    async fn create_stream(&self, stream_type: &str, initial_event: NewEvent) -> Result<Stream> {
        self.create_stream_with_id(Uuid::new_v4(), stream_type, initial_event)
            .await
    }

    async fn append_event(
        &self,
        stream_type: &str,
        stream_id: Uuid,
        revision: u64,
        new_event: NewEvent,
    ) -> Result<Stream> {
        validate::stream_type(stream_type)?;
        validate::new_event(&new_event)?;
        if revision < 2 {
            let mut errors = ValidationErrors::new();
            errors.add("revision", "must be at least 2; revision 1 is the creation event");
            return Err(EsError::Validation(errors));
        }

        let now = Utc::now();

        // Single write lock: the revision check, the head advance, and the
        // event insert are atomic, like the backend transaction.
        let mut streams = self.streams.write().await;
        let record = streams
            .get_mut(&stream_id)
            .ok_or(EsError::Conflict { stream_id, revision })?;

        if record.head.revision != revision - 1 {
            return Err(EsError::Conflict { stream_id, revision });
        }
        if record.events.iter().any(|e| e.revision == revision) {
            return Err(EsError::Conflict { stream_id, revision });
        }

        record.events.push(new_event.into_event(stream_id, revision, now));
        record.head.revision = revision;
        record.head.updated_at = now;

        Ok(record.head.clone())
    }

    async fn get_stream(&self, stream_id: Uuid) -> Result<Stream> {
        let streams = self.streams.read().await;
        streams
            .get(&stream_id)
            .map(|record| record.head.clone())
            .ok_or(EsError::NotFound { stream_id })
    }

    async fn get_events(&self, stream_id: Uuid, after_revision: u64) -> Result<EventPage> {
        let streams = self.streams.read().await;
        // An unknown stream reads as an empty log, matching a range scan
        // over an absent partition.
        let Some(record) = streams.get(&stream_id) else {
            return Ok(EventPage {
                events: Vec::new(),
                has_more: false,
                last_evaluated_revision: after_revision,
            });
        };

        let mut matching: Vec<Event> = record
            .events
            .iter()
            .filter(|e| e.revision > after_revision)
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.revision);

        let has_more = matching.len() > self.page_size;
        matching.truncate(self.page_size);
        let last_evaluated_revision = matching.last().map_or(after_revision, |e| e.revision);

        Ok(EventPage {
            events: matching,
            has_more,
            last_evaluated_revision,
        })
    }

    async fn get_streams(
        &self,
        stream_type: &str,
        updated_after: DateTime<Utc>,
        page_key: Option<&str>,
    ) -> Result<StreamPage> {
        validate::stream_type(stream_type)?;

        let start_after = page_key
            .map(StreamPageKey::decode)
            .transpose()?
            .map(|key| (key.updated_at, key.stream_id));

        let streams = self.streams.read().await;
        let mut matching: Vec<Stream> = streams
            .values()
            .map(|record| &record.head)
            .filter(|head| head.stream_type == stream_type && head.updated_at >= updated_after)
            .filter(|head| match start_after {
                Some(position) => (head.updated_at, head.stream_id) > position,
                None => true,
            })
            .cloned()
            .collect();
        matching.sort_by_key(|head| (head.updated_at, head.stream_id));

        let has_more = matching.len() > self.page_size;
        matching.truncate(self.page_size);

        let next_page_key = if has_more {
            matching.last().map(|head| {
                StreamPageKey {
                    stream_id: head.stream_id,
                    stream_type: head.stream_type.clone(),
                    updated_at: head.updated_at,
                }
                .encode()
            })
        } else {
            None
        };

        Ok(StreamPage {
            streams: matching,
            has_more,
            next_page_key,
        })
    }
}
