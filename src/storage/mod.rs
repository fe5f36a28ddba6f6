//! Storage implementations.

use aws_sdk_dynamodb::Client;
use tracing::info;

use crate::config::EsConfig;

pub mod cursor;
pub mod dynamo;
pub mod mock;

pub use cursor::StreamPageKey;
pub use dynamo::{DynamoEventStore, DEFAULT_PAGE_SIZE};
pub use mock::MockEventStore;

/// Initialize the DynamoDB event store from configuration.
pub async fn init_event_store(config: &EsConfig) -> DynamoEventStore {
    let aws_config = config.aws_config().await;
    let client = Client::new(&aws_config);

    info!(
        table = %config.table_name,
        region = ?config.region,
        endpoint = ?config.endpoint_url,
        "Connected to DynamoDB event store"
    );

    DynamoEventStore::new(client, &config.table_name).with_page_size(config.page_size)
}
