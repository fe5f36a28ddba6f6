//! Application configuration.
//!
//! Loaded from an optional YAML file layered with `ES`-prefixed environment
//! variables (e.g. `ES_TABLE_NAME`, `ES_QUEUE_URL`).

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "ES_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "ES";

/// Event store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EsConfig {
    /// DynamoDB table holding stream heads and events.
    pub table_name: String,
    /// SQS queue URL for stream-update notifications.
    pub queue_url: String,
    /// AWS region. Uses the default provider chain when not set.
    pub region: Option<String>,
    /// Custom endpoint URL (for LocalStack or testing).
    pub endpoint_url: Option<String>,
    /// Maximum items returned per query page.
    pub page_size: i32,
    /// Default long-poll wait in seconds a consumer loop passes to each
    /// receive call.
    pub wait_time_secs: i32,
}

impl Default for EsConfig {
    fn default() -> Self {
        Self {
            table_name: "event-store".to_string(),
            queue_url: String::new(),
            region: None,
            endpoint_url: None,
            page_size: 100,
            wait_time_secs: 1,
        }
    }
}

impl EsConfig {
    /// Load configuration from file (if present) and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let file =
            std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix(CONFIG_ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Resolve the AWS SDK configuration, applying region and endpoint
    /// overrides when set.
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(ref region) = self.region {
            builder = builder.region(aws_config::Region::new(region.clone()));
        }
        if let Some(ref endpoint) = self.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        builder.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = EsConfig::default();
        assert_eq!(config.table_name, "event-store");
        assert_eq!(config.page_size, 100);
        assert!(config.region.is_none());
    }

    #[test]
    fn deserializes_partial_yaml() {
        let config: EsConfig =
            serde_yaml_like("table_name: orders-es\npage_size: 25\n");
        assert_eq!(config.table_name, "orders-es");
        assert_eq!(config.page_size, 25);
        // Untouched fields keep their defaults.
        assert_eq!(config.wait_time_secs, 1);
    }

    fn serde_yaml_like(raw: &str) -> EsConfig {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }
}
