//! Reconciliation Driver
//!
//! Orchestrates the startup pass: walks the registry database by database,
//! loads or creates each table document, runs the reconciler, and writes
//! back only documents that changed. Assumes single-writer execution;
//! callers running multiple instances against one directory must serialize
//! startup externally.

use crate::config::Settings;
use crate::error::{MetadataError, Result};
use crate::metadata::{MetadataStore, TableDocument};
use crate::reconcile::reconciler::reconcile;
use crate::registry::{HandlerRegistry, TriggerSpec};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of one full reconciliation pass
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    pub documents_written: usize,
    pub triggers_reconciled: usize,
    pub written_paths: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Driver for the startup reconciliation pass
pub struct ReconciliationDriver;

impl ReconciliationDriver {
    pub fn new() -> Self {
        Self
    }

    /// Run the full pass.
    ///
    /// Idempotent: a second run over unchanged registrations writes zero
    /// documents. Any failure aborts the remaining pass with
    /// [`MetadataError::Aborted`] naming the documents already written and
    /// those still pending, so operators can diagnose partial application.
    pub async fn run(
        &self,
        registry: &HandlerRegistry,
        store: &MetadataStore,
        settings: &Settings,
    ) -> Result<ReconciliationSummary> {
        let started_at = Utc::now();
        let plan = plan(registry);

        info!(
            "Reconciling {} trigger(s) across {} table document(s) under {}",
            registry.len(),
            plan.len(),
            store.dir_path().display()
        );

        let mut written: Vec<PathBuf> = Vec::new();
        let mut triggers_reconciled = 0;

        for (i, (database_name, table_name, specs)) in plan.iter().enumerate() {
            match self
                .reconcile_one(store, settings, database_name, table_name, specs)
                .await
            {
                Ok(Some(path)) => written.push(path),
                Ok(None) => {}
                Err(e) => {
                    let pending = plan[i..]
                        .iter()
                        .map(|(db, table, _)| store.path_for(db, table))
                        .collect();
                    return Err(MetadataError::Aborted {
                        source: Box::new(e),
                        written,
                        pending,
                    });
                }
            }
            triggers_reconciled += specs.len();
        }

        let summary = ReconciliationSummary {
            documents_written: written.len(),
            triggers_reconciled,
            written_paths: written,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Reconciliation complete: {} document(s) written, {} trigger(s) reconciled",
            summary.documents_written, summary.triggers_reconciled
        );
        Ok(summary)
    }

    async fn reconcile_one(
        &self,
        store: &MetadataStore,
        settings: &Settings,
        database_name: &str,
        table_name: &str,
        specs: &[&TriggerSpec],
    ) -> Result<Option<PathBuf>> {
        let mut document = match store.load(database_name, table_name).await {
            Ok(document) => document,
            Err(MetadataError::DocumentNotFound { path }) => {
                // Explicit policy, not a silent fallback
                info!(
                    "No metadata document at {}, creating skeleton",
                    path.display()
                );
                TableDocument::skeleton(database_name, table_name)
            }
            Err(e) => return Err(e),
        };

        let changed = reconcile(&mut document, specs, settings)?;
        if !changed {
            debug!("{}.{} already up to date", database_name, table_name);
            return Ok(None);
        }

        let path = store.save(&document).await?;
        info!(
            "Updated trigger metadata for {}.{} ({} managed trigger(s))",
            database_name,
            table_name,
            specs.len()
        );
        Ok(Some(path))
    }
}

impl Default for ReconciliationDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Work plan: databases in sorted order, tables in the order they first
/// appear among a database's declarations. Both orders are deterministic
/// so repeated runs touch documents identically.
fn plan(registry: &HandlerRegistry) -> Vec<(String, String, Vec<&TriggerSpec>)> {
    let mut out: Vec<(String, String, Vec<&TriggerSpec>)> = Vec::new();
    for (database_name, specs) in registry.all_by_database() {
        let mut tables: Vec<(String, Vec<&TriggerSpec>)> = Vec::new();
        for spec in specs {
            match tables
                .iter_mut()
                .find(|(table, _)| table == &spec.key().table_name)
            {
                Some((_, group)) => group.push(spec),
                None => tables.push((spec.key().table_name.clone(), vec![spec])),
            }
        }
        for (table_name, group) in tables {
            out.push((database_name.clone(), table_name, group));
        }
    }
    out
}
