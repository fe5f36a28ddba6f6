//! Notification channel implementations.

use aws_sdk_sqs::Client;
use tracing::info;

use crate::config::EsConfig;

pub mod sqs;

pub use sqs::SqsNotificationSource;

/// Initialize the SQS notification source from configuration.
pub async fn init_notification_source(config: &EsConfig) -> SqsNotificationSource {
    let aws_config = config.aws_config().await;
    let client = Client::new(&aws_config);

    info!(
        queue_url = %config.queue_url,
        region = ?config.region,
        "Connected to SQS notification queue"
    );

    SqsNotificationSource::new(client, &config.queue_url)
}
