//! Notification source interface.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::EsNotification;

/// Read side of the stream-update notification channel.
///
/// Delivery is at-least-once: the same `(stream_id, stream_revision)` may
/// arrive more than once, and a notification left unacknowledged will be
/// redelivered. Consumers must be idempotent with respect to that pair.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Long-poll for pending notifications, blocking at most `wait_time`.
    ///
    /// Returns zero or more notifications, possibly duplicates of previously
    /// delivered but unacknowledged ones. An empty vec after a full wait
    /// means the queue was idle, not that the channel is closed.
    async fn receive(&self, wait_time: Duration) -> Result<Vec<EsNotification>>;

    /// Delete a notification after successful processing.
    ///
    /// Fails with `Acknowledge` when the delivery handle is stale; the
    /// message may then be redelivered, which is not a hard error.
    async fn acknowledge(&self, notification: &EsNotification) -> Result<()>;
}
