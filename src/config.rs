//! Configuration types for drive-gateway

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Drive REST API endpoint settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Base URL for metadata requests (default: "https://www.googleapis.com/drive/v3")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL for media uploads (default: "https://www.googleapis.com/upload/drive/v3")
    #[serde(default = "default_upload_base_url")]
    pub upload_base_url: String,

    /// Spaces queried when listing files (default: "drive")
    ///
    /// Without the full Drive scope the service only returns files created by
    /// this application, whatever the space.
    #[serde(default = "default_spaces")]
    pub spaces: String,

    /// Number of files requested per listing page (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Timeout applied to every HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            upload_base_url: default_upload_base_url(),
            spaces: default_spaces(),
            page_size: default_page_size(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Background worker settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Maximum number of operations waiting in the work queue (default: 64)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Name given to the worker thread (default: "drive-gateway-worker")
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            thread_name: default_thread_name(),
        }
    }
}

/// How lines of a text document are joined back together after reading
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePolicy {
    /// Lines are appended with no separator ("a\nb\nc" reads as "abc")
    #[default]
    Concatenate,
    /// Lines are joined with '\n', dropping any trailing terminator
    PreserveNewlines,
}

/// Document content settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Line joining policy for documents read as text
    #[serde(default)]
    pub line_policy: LinePolicy,
}

/// Main configuration for DriveGateway
///
/// Fields are organized into sub-configs:
/// - [`drive`](DriveConfig) — REST endpoints, listing and timeouts
/// - [`worker`](WorkerConfig) — work queue and worker thread
/// - [`content`](ContentConfig) — text decoding of documents
///
/// Credentials are not part of the configuration. The host application owns
/// authentication and hands an access token to [`DriveClient`](crate::storage::DriveClient).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Drive REST API settings
    #[serde(default)]
    pub drive: DriveConfig,

    /// Worker settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Document content settings
    #[serde(default)]
    pub content: ContentConfig,
}

impl Config {
    /// Parse a configuration from JSON, filling omitted fields with defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.worker.queue_capacity == 0 {
            return Err(config_error(
                "queue capacity must be at least 1",
                "queue_capacity",
            ));
        }
        if self.worker.thread_name.trim().is_empty() {
            return Err(config_error("thread name must not be empty", "thread_name"));
        }
        if self.drive.page_size == 0 {
            return Err(config_error("page size must be at least 1", "page_size"));
        }
        if self.drive.request_timeout.is_zero() {
            return Err(config_error(
                "request timeout must be greater than zero",
                "request_timeout",
            ));
        }
        validate_base_url(&self.drive.api_base_url, "api_base_url")?;
        validate_base_url(&self.drive.upload_base_url, "upload_base_url")?;
        Ok(())
    }
}

fn validate_base_url(value: &str, key: &str) -> Result<()> {
    let url = url::Url::parse(value)
        .map_err(|e| config_error(&format!("invalid URL '{}': {}", value, e), key))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(config_error(
            &format!("unsupported URL scheme '{}'", scheme),
            key,
        )),
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_upload_base_url() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

fn default_spaces() -> String {
    "drive".to_string()
}

fn default_page_size() -> u32 {
    100
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("drive-gateway/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_queue_capacity() -> usize {
    64
}

fn default_thread_name() -> String {
    "drive-gateway-worker".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        config.validate().expect("default config must validate");
        assert_eq!(config.drive.spaces, "drive");
        assert_eq!(config.worker.queue_capacity, 64);
        assert_eq!(config.content.line_policy, LinePolicy::Concatenate);
    }

    #[test]
    fn empty_json_fills_every_default() {
        let config = Config::from_json_str("{}").expect("empty object must parse");
        assert_eq!(
            config.drive.api_base_url,
            "https://www.googleapis.com/drive/v3"
        );
        assert_eq!(
            config.drive.upload_base_url,
            "https://www.googleapis.com/upload/drive/v3"
        );
        assert_eq!(config.drive.page_size, 100);
        assert_eq!(config.drive.request_timeout, Duration::from_secs(30));
        assert_eq!(config.worker.thread_name, "drive-gateway-worker");
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let json = r#"{
            "drive": { "spaces": "appDataFolder", "request_timeout": 5 },
            "content": { "line_policy": "preserve_newlines" }
        }"#;
        let config = Config::from_json_str(json).unwrap();

        assert_eq!(config.drive.spaces, "appDataFolder");
        assert_eq!(config.drive.request_timeout, Duration::from_secs(5));
        assert_eq!(config.drive.page_size, 100, "untouched field keeps default");
        assert_eq!(config.content.line_policy, LinePolicy::PreserveNewlines);
    }

    #[test]
    fn duration_serde_serializes_as_seconds() {
        let config = DriveConfig {
            request_timeout: Duration::from_secs(12),
            ..DriveConfig::default()
        };
        let json = serde_json::to_value(&config).expect("serialize failed");
        assert_eq!(
            json["request_timeout"], 12,
            "duration_serde must serialize Duration as integer seconds"
        );
    }

    #[test]
    fn zero_queue_capacity_is_rejected_with_key() {
        let mut config = Config::default();
        config.worker.queue_capacity = 0;

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("queue_capacity")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn zero_page_size_and_timeout_are_rejected() {
        let mut config = Config::default();
        config.drive.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.drive.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let mut config = Config::default();
        config.drive.api_base_url = "ftp://example.com/drive".to_string();

        match config.validate() {
            Err(Error::Config { key, message }) => {
                assert_eq!(key.as_deref(), Some("api_base_url"));
                assert!(message.contains("ftp"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let mut config = Config::default();
        config.drive.upload_base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn from_json_str_reports_invalid_json_as_serialization_error() {
        let result = Config::from_json_str("{ not json");
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
