//! SQS notification consumer.
//!
//! Receives stream-update notifications from the queue the store's change
//! stream publishes to (via SNS), and deletes them on acknowledgment.
//! Undecodable messages are logged and left un-acked so they surface again
//! through the queue's redelivery policy instead of failing the batch.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use tracing::{debug, warn};

use crate::error::{EsError, Result};
use crate::interfaces::NotificationSource;
use crate::types::EsNotification;

/// Default maximum messages per receive call.
const DEFAULT_MAX_MESSAGES: i32 = 10;
/// SQS caps a long poll at 20 seconds.
const MAX_WAIT_TIME_SECS: u64 = 20;

/// SQS-backed notification source.
pub struct SqsNotificationSource {
    sqs: Client,
    queue_url: String,
    max_messages: i32,
}

impl SqsNotificationSource {
    /// Create a source over an existing client and queue URL.
    pub fn new(sqs: Client, queue_url: impl Into<String>) -> Self {
        Self {
            sqs,
            queue_url: queue_url.into(),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }

    /// Set the maximum number of messages per receive call.
    pub fn with_max_messages(mut self, max: i32) -> Self {
        self.max_messages = max;
        self
    }
}

/// Clamp a caller wait to the SQS long-poll ceiling. Sub-second waits round
/// down to 0, which makes the receive a short poll.
fn wait_secs(wait_time: Duration) -> i32 {
    wait_time.as_secs().min(MAX_WAIT_TIME_SECS) as i32
}

#[async_trait]
impl NotificationSource for SqsNotificationSource {
    async fn receive(&self, wait_time: Duration) -> Result<Vec<EsNotification>> {
        let output = self
            .sqs
            .receive_message()
            .queue_url(&self.queue_url)
            .wait_time_seconds(wait_secs(wait_time))
            .max_number_of_messages(self.max_messages)
            .send()
            .await
            .map_err(|e| EsError::Transient(format!("failed to receive from SQS: {e}")))?;

        let messages = output.messages();
        let mut notifications = Vec::with_capacity(messages.len());

        for message in messages {
            let (Some(body), Some(receipt)) = (message.body(), message.receipt_handle()) else {
                warn!(message_id = ?message.message_id(), "skipping message without body or receipt");
                continue;
            };

            match EsNotification::decode(body, receipt) {
                Ok(notification) => {
                    debug!(
                        stream_id = %notification.stream_id,
                        stream_revision = notification.stream_revision,
                        "received notification"
                    );
                    notifications.push(notification);
                }
                Err(err) => {
                    // Left un-acked: the visibility timeout will expire and
                    // the queue's redelivery policy takes over.
                    warn!(error = %err, "failed to decode notification, leaving for redelivery");
                }
            }
        }

        Ok(notifications)
    }

    async fn acknowledge(&self, notification: &EsNotification) -> Result<()> {
        self.sqs
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(notification.receipt_handle())
            .send()
            .await
            .map_err(|e| EsError::Acknowledge(format!("failed to delete from SQS: {e}")))?;

        debug!(
            stream_id = %notification.stream_id,
            stream_revision = notification.stream_revision,
            "acknowledged notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_clamps_to_sqs_long_poll_ceiling() {
        assert_eq!(wait_secs(Duration::from_secs(0)), 0);
        assert_eq!(wait_secs(Duration::from_millis(500)), 0);
        assert_eq!(wait_secs(Duration::from_secs(5)), 5);
        assert_eq!(wait_secs(Duration::from_secs(20)), 20);
        assert_eq!(wait_secs(Duration::from_secs(120)), 20);
    }
}
