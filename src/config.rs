use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::time::Duration;

/// Configuration for the TTN webhook service
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB client
    pub dynamodb_client: DynamoDbClient,
    /// Sensor registry table name (keyed by dev_eui)
    pub sensors_table: String,
    /// Ingestion endpoint readings are forwarded to
    pub ingest_endpoint_url: String,
    /// Bearer token for the ingestion endpoint, if it requires one
    pub ingest_auth_token: Option<String>,
    /// Hex SHA-256 of the shared secret callers send in X-Webhook-Secret
    pub webhook_secret_hash: String,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub async fn from_env() -> Result<Self, ConfigError> {
        // Check variables first so a misconfigured function fails without touching AWS
        let sensors_table = required_var("SENSORS_TABLE")?;
        let ingest_endpoint_url = required_var("INGEST_ENDPOINT_URL")?;
        let webhook_secret_hash = required_var("WEBHOOK_SECRET_HASH")?.to_ascii_lowercase();
        let ingest_auth_token = std::env::var("INGEST_AUTH_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        if !ingest_endpoint_url.starts_with("http://") && !ingest_endpoint_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue(
                "INGEST_ENDPOINT_URL".to_string(),
                "must be an http(s) URL".to_string(),
            ));
        }

        if webhook_secret_hash.len() != 64 || hex::decode(&webhook_secret_hash).is_err() {
            return Err(ConfigError::InvalidValue(
                "WEBHOOK_SECRET_HASH".to_string(),
                "must be a hex-encoded SHA-256 digest".to_string(),
            ));
        }

        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;

        // Leave headroom below the Lambda timeout for the ingestion call
        let dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&aws_config)
            .timeout_config(
                aws_sdk_dynamodb::config::timeout::TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(10))
                    .operation_attempt_timeout(Duration::from_secs(5))
                    .build(),
            )
            .build();

        let dynamodb_client = DynamoDbClient::from_conf(dynamodb_config);

        Ok(Config {
            dynamodb_client,
            sensors_table,
            ingest_endpoint_url,
            ingest_auth_token,
            webhook_secret_hash,
        })
    }

    /// Create a test configuration pointing at local endpoints
    #[cfg(test)]
    pub fn for_test(
        dynamodb_endpoint_url: &str,
        sensors_table: String,
        ingest_endpoint_url: String,
        webhook_secret_hash: String,
    ) -> Self {
        use aws_sdk_dynamodb::config::{Credentials, Region};

        let credentials =
            Credentials::new("test_access_key", "test_secret_key", None, None, "test");

        let dynamodb_config = aws_sdk_dynamodb::config::Builder::new()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(dynamodb_endpoint_url)
            .timeout_config(
                aws_sdk_dynamodb::config::timeout::TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(2))
                    .operation_attempt_timeout(Duration::from_secs(1))
                    .build(),
            )
            .build();

        Config {
            dynamodb_client: DynamoDbClient::from_conf(dynamodb_config),
            sensors_table,
            ingest_endpoint_url,
            ingest_auth_token: None,
            webhook_secret_hash,
        }
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingEnvVar(name.to_string())),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}
