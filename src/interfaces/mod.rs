//! Abstract interfaces for store components.
//!
//! These traits define the contracts for:
//! - Event store (stream/event persistence with optimistic concurrency)
//! - Notification source (at-least-once stream-update delivery)

pub mod event_store;
pub mod notification_source;

pub use event_store::EventStore;
pub use notification_source::NotificationSource;
