//! Error handling module
//!
//! Provides the unified error taxonomy for registration, reconciliation,
//! and dispatch.

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Two handlers claimed the same (database, table, trigger) key.
    /// Fatal at startup: a trigger must have exactly one owner.
    #[error("duplicate trigger '{trigger}' on {database}.{table}")]
    DuplicateTrigger {
        database: String,
        table: String,
        trigger: String,
    },

    /// Dispatch-time lookup miss. Surfaced to the caller as a failed
    /// webhook delivery, not fatal to the process.
    #[error("no handler registered for trigger '{trigger}' on {database}.{table}")]
    UnknownTrigger {
        database: String,
        table: String,
        trigger: String,
    },

    /// No metadata document exists at the computed path. The driver
    /// recovers by creating a skeleton document.
    #[error("metadata document not found: {}", .path.display())]
    DocumentNotFound { path: PathBuf },

    /// The file at the computed path is not a mapping-rooted document.
    #[error("malformed metadata document {}: {reason}", .path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    /// A handler declared configuration the table metadata cannot express.
    /// Fatal at reconciliation time: a misconfigured handler must not
    /// silently produce broken metadata.
    #[error("invalid trigger definition for '{trigger}': {reason}")]
    InvalidTriggerDefinition { trigger: String, reason: String },

    /// A declaration failed validation before registration.
    #[error("invalid trigger declaration: {0}")]
    Validation(String),

    /// The reconciliation pass stopped early. `written` documents made it
    /// to disk before the failure; `pending` did not.
    #[error("reconciliation pass aborted: {source}")]
    Aborted {
        #[source]
        source: Box<MetadataError>,
        written: Vec<PathBuf>,
        pending: Vec<PathBuf>,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl MetadataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias used across the crate
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> MetadataError {
    MetadataError::Validation(msg.into())
}

/// Helper function to create an invalid-definition error
pub fn invalid_definition(trigger: impl Into<String>, reason: impl Into<String>) -> MetadataError {
    MetadataError::InvalidTriggerDefinition {
        trigger: trigger.into(),
        reason: reason.into(),
    }
}
