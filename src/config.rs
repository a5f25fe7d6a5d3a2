//! Application configuration module
//!
//! Typed settings for the webhook boundary and the managed metadata store.
//! Environment variable names configured here are embedded as *references*
//! in written metadata, never as resolved values, so checked-in documents
//! carry no live secrets.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Webhook delivery configuration shared by every managed trigger
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Header name carrying the shared secret on trigger callbacks.
    /// The HTTP layer verifies it; we only write its name into metadata.
    pub secret_header: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret_header: "x-trigger-secret".to_string(),
        }
    }
}

/// Retry/backoff policy for webhook delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    pub interval_seconds: u32,
    pub num_retries: u32,
    pub timeout_seconds: u32,
    /// Window in which a missed delivery is still retried rather than dropped
    pub tolerance_seconds: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 15,
            num_retries: 3,
            timeout_seconds: 100,
            tolerance_seconds: 21600,
        }
    }
}

/// Managed metadata configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedMetadataConfig {
    /// Root of the metadata directory tree
    pub dir_path: PathBuf,
    /// Name of the env var whose value is the webhook secret header value
    pub secret_header_env_name: String,
    /// Name of the env var whose value is the webhook endpoint URL
    pub endpoint_env_name: String,
    /// Fallback retry policy when a declaration supplies none
    #[serde(default)]
    pub default_retry: RetryConfig,
    /// Database name used when a declaration omits one
    #[serde(default = "default_database_name")]
    pub default_database: String,
}

fn default_database_name() -> String {
    "default".to_string()
}

/// Complete settings for the trigger subsystem
#[derive(Debug, Clone)]
pub struct Settings {
    pub webhook: WebhookConfig,
    pub metadata: ManagedMetadataConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let dir_path = std::env::var("TRIGGERFLOW_METADATA_DIR")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::MissingVar("TRIGGERFLOW_METADATA_DIR".to_string()))?;

        let webhook = WebhookConfig {
            secret_header: std::env::var("TRIGGERFLOW_SECRET_HEADER")
                .unwrap_or_else(|_| WebhookConfig::default().secret_header),
        };

        let defaults = RetryConfig::default();
        let default_retry = RetryConfig {
            interval_seconds: env_u32("TRIGGERFLOW_RETRY_INTERVAL_SECONDS", defaults.interval_seconds)?,
            num_retries: env_u32("TRIGGERFLOW_RETRY_NUM_RETRIES", defaults.num_retries)?,
            timeout_seconds: env_u32("TRIGGERFLOW_RETRY_TIMEOUT_SECONDS", defaults.timeout_seconds)?,
            tolerance_seconds: env_u32("TRIGGERFLOW_RETRY_TOLERANCE_SECONDS", defaults.tolerance_seconds)?,
        };

        let metadata = ManagedMetadataConfig {
            dir_path,
            secret_header_env_name: std::env::var("TRIGGERFLOW_SECRET_ENV_NAME")
                .unwrap_or_else(|_| "TRIGGERFLOW_WEBHOOK_SECRET_HEADER_VALUE".to_string()),
            endpoint_env_name: std::env::var("TRIGGERFLOW_ENDPOINT_ENV_NAME")
                .unwrap_or_else(|_| "TRIGGERFLOW_EVENT_WEBHOOK_ENDPOINT".to_string()),
            default_retry,
            default_database: std::env::var("TRIGGERFLOW_DEFAULT_DATABASE")
                .unwrap_or_else(|_| default_database_name()),
        };

        Ok(Self { webhook, metadata })
    }
}

fn env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("{name}={raw} (expected integer)"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_retry_config() {
        let retry = RetryConfig::default();
        assert_eq!(retry.interval_seconds, 15);
        assert_eq!(retry.num_retries, 3);
        assert_eq!(retry.timeout_seconds, 100);
        assert_eq!(retry.tolerance_seconds, 21600);
    }

    #[test]
    fn default_webhook_config() {
        let webhook = WebhookConfig::default();
        assert_eq!(webhook.secret_header, "x-trigger-secret");
    }
}
