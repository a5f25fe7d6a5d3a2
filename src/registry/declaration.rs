//! Trigger declaration models
//!
//! What a handler states about itself at registration time. Names declared
//! here become SQL identifiers and file path components, so they are
//! validated as strict identifiers before anything touches the filesystem.

use crate::config::RetryConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Database operations a trigger can fire on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Insert,
    Update,
    Delete,
    /// Fired only by explicit invocation, never by row operations
    Manual,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Insert => "insert",
            OperationType::Update => "update",
            OperationType::Delete => "delete",
            OperationType::Manual => "manual",
        }
    }
}

/// Operation definition: which operation fires the trigger, optionally
/// narrowed to a set of columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerOperation {
    #[serde(rename = "type")]
    pub kind: OperationType,
    /// Column filter; `None` means all columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl TriggerOperation {
    pub fn all_columns(kind: OperationType) -> Self {
        Self {
            kind,
            columns: None,
        }
    }

    pub fn with_columns(kind: OperationType, columns: Vec<String>) -> Self {
        Self {
            kind,
            columns: Some(columns),
        }
    }
}

/// Partial retry override attached to a single declaration.
///
/// Each unset field falls back to the globally configured default
/// independently (per-field fallback, not all-or-nothing).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryOverrides {
    pub interval_seconds: Option<u32>,
    pub num_retries: Option<u32>,
    pub timeout_seconds: Option<u32>,
    pub tolerance_seconds: Option<u32>,
}

impl RetryOverrides {
    /// Resolve against the global default, field by field
    pub fn resolve(&self, default: &RetryConfig) -> RetryConfig {
        RetryConfig {
            interval_seconds: self.interval_seconds.unwrap_or(default.interval_seconds),
            num_retries: self.num_retries.unwrap_or(default.num_retries),
            timeout_seconds: self.timeout_seconds.unwrap_or(default.timeout_seconds),
            tolerance_seconds: self.tolerance_seconds.unwrap_or(default.tolerance_seconds),
        }
    }
}

/// A declared trigger handler, before registration
#[derive(Debug, Clone, PartialEq, Eq, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDeclaration {
    /// Logical database; resolves to the configured default when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = validate_identifier))]
    pub database_name: Option<String>,

    #[validate(length(min = 1, max = 63, message = "Table name must be between 1 and 63 characters"))]
    #[validate(custom(function = validate_identifier))]
    pub table_name: String,

    #[validate(length(min = 1, max = 127, message = "Trigger name must be between 1 and 127 characters"))]
    #[validate(custom(function = validate_identifier))]
    pub trigger_name: String,

    pub definition: TriggerOperation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryOverrides>,
}

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("identifier regex"));

/// Validate a SQL identifier that will also become a file path component
fn validate_identifier(name: &str) -> Result<(), validator::ValidationError> {
    if !IDENTIFIER.is_match(name) {
        let mut err = validator::ValidationError::new("invalid_identifier");
        err.message = Some(
            "Must start with a letter or underscore and contain only letters, digits, underscores."
                .into(),
        );
        return Err(err);
    }
    Ok(())
}
