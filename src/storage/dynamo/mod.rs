//! DynamoDB storage backend.
//!
//! Single-table layout: stream heads at sort key 0, events at their revision,
//! and a `StreamIndex` GSI ordering heads by `(StreamType, UpdatedAt)`.

pub mod db_event;
pub mod db_stream;
pub mod event_store;
pub mod keys;

pub use event_store::{DynamoEventStore, DEFAULT_PAGE_SIZE};
