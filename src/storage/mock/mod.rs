//! In-memory storage backend for testing.

pub mod event_store;

pub use event_store::MockEventStore;
