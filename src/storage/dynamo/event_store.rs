//! DynamoDB implementation of the event store.
//!
//! Creation and append both commit two records as one `TransactWriteItems`
//! call: the stream head mutation and the event insert are indivisible, so a
//! reader can never observe a stream whose revision advanced without the
//! corresponding event, or the reverse. Conflicting writes to the same head
//! serialize inside DynamoDB; no in-process locks are held.

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::TransactWriteItem;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, error};
use uuid::Uuid;

use super::{db_event, db_stream, keys};
use crate::error::{EsError, Result, ValidationErrors};
use crate::interfaces::EventStore;
use crate::storage::cursor::{format_ts, StreamPageKey};
use crate::types::{EventPage, NewEvent, Stream, StreamPage};
use crate::validate;

/// Default maximum items per query page.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// DynamoDB-backed event store.
pub struct DynamoEventStore {
    client: Client,
    table_name: String,
    page_size: i32,
}

impl DynamoEventStore {
    /// Create a store over an existing client and table.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the maximum number of items returned per query page.
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    async fn get_head(&self, stream_id: Uuid, consistent: bool) -> Result<Stream> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(keys::head_key(stream_id)))
            .consistent_read(consistent)
            .send()
            .await
            .map_err(|e| EsError::Transient(format!("failed to get stream: {e}")))?;

        match output.item() {
            Some(item) => db_stream::parse_stream(item),
            None => Err(EsError::NotFound { stream_id }),
        }
    }
}

/// Idempotency token for one append attempt, derived deterministically from
/// `(stream_id, target_revision)` so a transport-level retry of the same
/// attempt reuses the same token. Stays within DynamoDB's 36-character limit.
fn append_token(stream_id: Uuid, revision: u64) -> String {
    Uuid::new_v5(&stream_id, &revision.to_be_bytes()).to_string()
}

/// Map a failed transaction to the domain outcome.
///
/// A cancellation caused by a failed condition check means the optimistic
/// gate rejected the attempt; everything else is a backend failure with no
/// determinable outcome.
fn classify_transact_error(err: TransactWriteItemsError, on_condition_failure: EsError) -> EsError {
    match err {
        TransactWriteItemsError::TransactionCanceledException(ref cancel) => {
            let reasons = cancel.cancellation_reasons();
            error!(
                message = ?cancel.message(),
                reasons = ?reasons,
                "transaction canceled"
            );
            if reasons
                .iter()
                .any(|reason| reason.code() == Some("ConditionalCheckFailed"))
            {
                return on_condition_failure;
            }
        }
        // The token is derived from (stream_id, revision), so two writers
        // racing the same revision with different payloads collide on it
        // inside the idempotency window. The first writer owns the
        // revision; the collision is the same loss as a failed condition.
        TransactWriteItemsError::IdempotentParameterMismatchException(ref mismatch) => {
            error!(message = ?mismatch.message(), "idempotent parameter mismatch");
            return on_condition_failure;
        }
        _ => {}
    }
    EsError::Transient(format!("transact_write_items failed: {err}"))
}

#[async_trait]
impl EventStore for DynamoEventStore {
    async fn create_stream(&self, stream_type: &str, initial_event: NewEvent) -> Result<Stream> {
        validate::stream_type(stream_type)?;
        validate::new_event(&initial_event)?;

        let stream_id = Uuid::new_v4();
        let now = Utc::now();
        let stream = Stream {
            stream_id,
            stream_type: stream_type.to_string(),
            revision: 1,
            created_at: now,
            updated_at: now,
        };
        let event = initial_event.into_event(stream_id, 1, now);

        let head_put = db_stream::put_new_stream(&self.table_name, &stream)?;
        let event_put = db_event::put_event(&self.table_name, &event)?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(head_put).build())
            .transact_items(TransactWriteItem::builder().put(event_put).build())
            .client_request_token(append_token(stream_id, 1))
            .send()
            .await
            .map_err(|e| {
                classify_transact_error(
                    e.into_service_error(),
                    EsError::DuplicateStream { stream_id },
                )
            })?;

        debug!(stream_id = %stream_id, stream_type = %stream.stream_type, "created stream");
        Ok(stream)
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
        let event = new_event.into_event(stream_id, revision, now);

        let head_update = db_stream::advance_stream(&self.table_name, stream_id, revision - 1, now)?;
        let event_put = db_event::put_event(&self.table_name, &event)?;

        self.client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().update(head_update).build())
            .transact_items(TransactWriteItem::builder().put(event_put).build())
            .client_request_token(append_token(stream_id, revision))
            .send()
            .await
            .map_err(|e| {
                classify_transact_error(
                    e.into_service_error(),
                    EsError::Conflict { stream_id, revision },
                )
            })?;

        debug!(stream_id = %stream_id, revision, "appended event");
        // The transaction only advanced the head; re-read it (consistently,
        // so the committed write is visible) to return the full record,
        // creation time included.
        self.get_head(stream_id, true).await
    }

    async fn get_stream(&self, stream_id: Uuid) -> Result<Stream> {
        self.get_head(stream_id, false).await
    }

    async fn get_events(&self, stream_id: Uuid, after_revision: u64) -> Result<EventPage> {
        let output = db_event::events_query(
            &self.client,
            &self.table_name,
            stream_id,
            after_revision,
            self.page_size,
        )
        .send()
        .await
        .map_err(|e| EsError::Transient(format!("failed to query events: {e}")))?;

        let events = output
            .items()
            .iter()
            .map(db_event::parse_event)
            .collect::<Result<Vec<_>>>()?;

        let last_evaluated_revision = events.last().map_or(after_revision, |e| e.revision);

        Ok(EventPage {
            events,
            has_more: output.last_evaluated_key().is_some(),
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

        let mut query = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(keys::STREAM_INDEX)
            .key_condition_expression("#stream_type = :stream_type AND #updated_at >= :updated_after")
            .expression_attribute_names("#stream_type", "StreamType")
            .expression_attribute_names("#updated_at", "UpdatedAt")
            .expression_attribute_values(
                ":stream_type",
                aws_sdk_dynamodb::types::AttributeValue::S(stream_type.to_string()),
            )
            .expression_attribute_values(
                ":updated_after",
                aws_sdk_dynamodb::types::AttributeValue::S(format_ts(updated_after)),
            )
            .scan_index_forward(true)
            .limit(self.page_size);

        if let Some(token) = page_key {
            let decoded = StreamPageKey::decode(token)?;
            query = query.set_exclusive_start_key(Some(decoded.to_exclusive_start_key()));
        }

        let output = query
            .send()
            .await
            .map_err(|e| EsError::Transient(format!("failed to query streams: {e}")))?;

        let streams = output
            .items()
            .iter()
            .map(db_stream::parse_stream)
            .collect::<Result<Vec<_>>>()?;

        let next_page_key = match output.last_evaluated_key() {
            Some(key) => Some(StreamPageKey::from_last_evaluated_key(key)?.encode()),
            None => None,
        };

        Ok(StreamPage {
            streams,
            has_more: next_page_key.is_some(),
            next_page_key,
        })
    }
}
