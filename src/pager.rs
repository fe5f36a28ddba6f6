//! Lazy, resumable page sequences over the event store.
//!
//! Pages are fetched on demand: nothing is queried until the sequence is
//! polled, fetching stops when the store reports no more pages, and dropping
//! the sequence early fetches nothing further.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{try_unfold, Stream};
use uuid::Uuid;

use crate::error::Result;
use crate::interfaces::EventStore;
use crate::types::{EventPage, StreamPage};

/// All pages of a stream's events after `after_revision`, in revision order.
pub fn event_pages(
    store: Arc<dyn EventStore>,
    stream_id: Uuid,
    after_revision: u64,
) -> impl Stream<Item = Result<EventPage>> {
    try_unfold(Some(after_revision), move |state| {
        let store = Arc::clone(&store);
        async move {
            let Some(after) = state else {
                return Ok(None);
            };
            let page = store.get_events(stream_id, after).await?;
            let next = page.has_more.then_some(page.last_evaluated_revision);
            Ok(Some((page, next)))
        }
    })
}

/// All pages of a stream listing, following continuation tokens.
pub fn stream_pages(
    store: Arc<dyn EventStore>,
    stream_type: impl Into<String>,
    updated_after: DateTime<Utc>,
) -> impl Stream<Item = Result<StreamPage>> {
    enum State {
        Start,
        Next(String),
        Done,
    }

    let stream_type = stream_type.into();
    try_unfold(State::Start, move |state| {
        let store = Arc::clone(&store);
        let stream_type = stream_type.clone();
        async move {
            let page_key = match state {
                State::Start => None,
                State::Next(key) => Some(key),
                State::Done => return Ok(None),
            };
            let page = store
                .get_streams(&stream_type, updated_after, page_key.as_deref())
                .await?;
            let next = match page.next_page_key.clone() {
                Some(key) if page.has_more => State::Next(key),
                _ => State::Done,
            };
            Ok(Some((page, next)))
        }
    })
}
