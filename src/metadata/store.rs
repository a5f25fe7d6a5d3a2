//! Metadata Document Store
//!
//! Loads and serializes per-database, per-table documents from a directory
//! tree:
//!
//! ```text
//! {dir_path}/
//!   databases/
//!     {database_name}/
//!       tables/
//!         public_{table_name}.yaml
//! ```
//!
//! Callers address documents logically by (database, table); the physical
//! layout stays private to this module. Writes are whole-file replaces via
//! a sibling temp file and rename, never in-place patches.

use crate::error::{MetadataError, Result};
use crate::metadata::document::{fingerprint_of, TableDocument};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Store for table metadata documents rooted at a configured directory
pub struct MetadataStore {
    dir_path: PathBuf,
}

impl MetadataStore {
    pub fn new(dir_path: impl Into<PathBuf>) -> Self {
        Self {
            dir_path: dir_path.into(),
        }
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir_path
    }

    /// Physical path for a logical (database, table) address
    pub fn path_for(&self, database_name: &str, table_name: &str) -> PathBuf {
        self.dir_path
            .join("databases")
            .join(database_name)
            .join("tables")
            .join(format!("public_{table_name}.yaml"))
    }

    pub async fn exists(&self, database_name: &str, table_name: &str) -> bool {
        fs::try_exists(self.path_for(database_name, table_name))
            .await
            .unwrap_or(false)
    }

    /// Load a document.
    ///
    /// Fails with [`MetadataError::DocumentNotFound`] when no file exists at
    /// the computed path; the reconciliation driver answers that by creating
    /// a skeleton document.
    pub async fn load(&self, database_name: &str, table_name: &str) -> Result<TableDocument> {
        let path = self.path_for(database_name, table_name);

        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MetadataError::DocumentNotFound { path });
            }
            Err(e) => return Err(MetadataError::io(path, e)),
        };

        let root = if text.trim().is_empty() {
            Mapping::new()
        } else {
            match serde_yaml::from_str::<Value>(&text)
                .map_err(|e| MetadataError::yaml(path.clone(), e))?
            {
                Value::Mapping(mapping) => mapping,
                Value::Null => Mapping::new(),
                other => {
                    return Err(MetadataError::MalformedDocument {
                        path,
                        reason: format!(
                            "expected a mapping at the document root, found {}",
                            value_kind(&other)
                        ),
                    });
                }
            }
        };

        debug!("Loaded metadata document {}", path.display());
        Ok(TableDocument::new(database_name, table_name, root))
    }

    /// Write a document back in canonical key ordering.
    ///
    /// Parent directories are created on demand. The write is a temp file
    /// plus rename so a crash never leaves a half-written document.
    pub async fn save(&self, document: &TableDocument) -> Result<PathBuf> {
        let path = self.path_for(document.database_name(), document.table_name());
        let text = document
            .to_canonical_yaml()
            .map_err(|e| MetadataError::yaml(path.clone(), e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| MetadataError::io(parent.to_path_buf(), e))?;
        }

        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, text.as_bytes())
            .await
            .map_err(|e| MetadataError::io(temp_path.clone(), e))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| MetadataError::io(path.clone(), e))?;

        debug!(
            "Wrote metadata document {} ({} bytes, checksum {})",
            path.display(),
            text.len(),
            fingerprint_of(&text)
        );
        Ok(path)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Sequence(_) => "a sequence",
        Value::String(_) => "a string",
        Value::Number(_) => "a number",
        Value::Bool(_) => "a boolean",
        _ => "a scalar",
    }
}
