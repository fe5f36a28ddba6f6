//! Event store interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{EventPage, NewEvent, Stream, StreamPage};

/// Interface for stream and event persistence.
///
/// A stream is created once (revision 1, with its first event) and only ever
/// mutated by successful appends. The stream head is the single serialization
/// point per stream: an append targeting revision `N` commits iff the head is
/// still at `N - 1`, and the head advance and event insert are indivisible.
///
/// Implementations:
/// - `DynamoEventStore`: DynamoDB storage (transactional conditional writes)
/// - `MockEventStore`: in-memory store with the same gating, for testing
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Create a new stream at revision 1 with its first event.
    ///
    /// The stream id is generated here and never reused. Fails with
    /// `DuplicateStream` if a head record somehow already exists.
    async fn create_stream(&self, stream_type: &str, initial_event: NewEvent) -> Result<Stream>;

    /// Append an event at `revision`, the revision the caller believes is
    /// next.
    ///
    /// Fails with `Conflict` when the stored revision is not `revision - 1`;
    /// the caller must re-read the stream and retry with the corrected
    /// revision, or surface the conflict. No automatic retry is performed.
    async fn append_event(
        &self,
        stream_type: &str,
        stream_id: Uuid,
        revision: u64,
        new_event: NewEvent,
    ) -> Result<Stream>;

    /// Read a stream's current head. Fails with `NotFound` when the stream
    /// does not exist.
    async fn get_stream(&self, stream_id: Uuid) -> Result<Stream>;

    /// Read one page of events strictly after `after_revision`, ordered by
    /// ascending revision. Pass 0 to start from the beginning.
    async fn get_events(&self, stream_id: Uuid, after_revision: u64) -> Result<EventPage>;

    /// List one page of streams of `stream_type` updated at or after
    /// `updated_after`, ordered by `updated_at` ascending. Pass the previous
    /// page's `next_page_key` to continue.
    async fn get_streams(
        &self,
        stream_type: &str,
        updated_after: DateTime<Utc>,
        page_key: Option<&str>,
    ) -> Result<StreamPage>;
}
