//! Event-sourcing store on DynamoDB with SQS stream notifications.
//!
//! Callers create named, typed streams, append events with strict ordering,
//! and read back events or enumerate streams. Consistency comes from the
//! database's conditional transactional writes: the stream head is the
//! per-stream serialization point, and every append commits the head advance
//! and the event insert as one all-or-nothing transaction. A downstream
//! subscriber consumes at-least-once stream-update notifications from SQS.

pub mod bus;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod pager;
pub mod storage;
pub mod types;
pub mod validate;

pub use config::EsConfig;
pub use error::{EsError, Result, ValidationErrors};
pub use interfaces::{EventStore, NotificationSource};
pub use types::{EsNotification, Event, EventPage, NewEvent, Stream, StreamPage};
