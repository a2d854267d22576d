use std::{env, time::Duration};

use microposts_core::storage::keys::resolve_table_name;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the DynamoDB table holding every row.
    pub table_name: String,
    /// Local DynamoDB endpoint. When set, static dummy credentials are used.
    pub dynamo_endpoint: Option<String>,
    /// AWS region (default: "ap-northeast-1")
    pub region: String,
    /// Per-request timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,
    /// Verbose logging and entity dumps.
    pub debug: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TEST_DYNAMO_TABLE_NAME` - Table name override, wins over everything else
    /// - `PROJECT_NAME` - Table name prefix (default: "microposts")
    /// - `DYNAMO_TABLE_NAME` - Table name body (default: "main")
    /// - `DYNAMO_TABLE_VERSION` - Optional table name suffix
    /// - `DYNAMO_ENDPOINT` / `AWS_ENDPOINT_URL` - Local endpoint
    /// - `AWS_REGION` - Region (default: "ap-northeast-1")
    /// - `REQUEST_TIMEOUT_SECONDS` - Request timeout (default: 10)
    /// - `DEBUG` - Any non-empty value enables debug output
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            table_name: resolve_table_name(|name| env::var(name).ok()),
            dynamo_endpoint: non_empty("DYNAMO_ENDPOINT").or_else(|| non_empty("AWS_ENDPOINT_URL")),
            region: non_empty("AWS_REGION").unwrap_or_else(|| "ap-northeast-1".to_string()),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            debug: non_empty("DEBUG").is_some(),
        }
    }

    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Default tracing filter when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "microposts=debug,tower_http=debug"
        } else {
            "microposts=info,tower_http=info"
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
