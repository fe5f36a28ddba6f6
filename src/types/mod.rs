//! Canonical domain types.
//!
//! One schema, versioned here: a stream head carries `(stream_type, revision,
//! updated_at)`; events carry `(event_type, payload, created_at)`. Payloads
//! are caller-opaque JSON stored verbatim.

mod event;
mod notification;
mod stream;

pub use event::{Event, EventPage, NewEvent};
pub use notification::EsNotification;
pub use stream::{Stream, StreamPage};
