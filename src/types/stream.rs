//! Stream head and stream listing page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, typed, append-only event stream.
///
/// `revision` starts at 1 and advances by exactly 1 per accepted append;
/// at any observation point it equals the count of events durably accepted
/// for this stream.
///
/// `created_at` is set once at creation and never moves; only `revision`
/// and `updated_at` change on append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub stream_id: Uuid,
    pub stream_type: String,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of a stream listing, ordered by `updated_at` ascending.
///
/// `next_page_key` is present iff `has_more` is true; feed it back into the
/// listing call to continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPage {
    pub streams: Vec<Stream>,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_key: Option<String>,
}
