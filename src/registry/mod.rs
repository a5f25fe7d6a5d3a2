//! Handler Registry
//!
//! Process-wide catalog of declared trigger handlers. Populated once at
//! startup via explicit registration, then read by the reconciliation
//! driver and the webhook dispatch layer. Iteration order is declaration
//! order so repeated reconciliation runs produce byte-identical output.

pub mod declaration;
pub mod handler;

pub use declaration::{OperationType, RetryOverrides, TriggerDeclaration, TriggerOperation};
pub use handler::{build_registry, EventHandler, FnHandler, TriggerHandlerProvider};

use crate::error::{MetadataError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

/// Uniquely identifies one event trigger
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerKey {
    pub database_name: String,
    pub table_name: String,
    pub trigger_name: String,
}

impl TriggerKey {
    pub fn new(
        database_name: impl Into<String>,
        table_name: impl Into<String>,
        trigger_name: impl Into<String>,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            table_name: table_name.into(),
            trigger_name: trigger_name.into(),
        }
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}/{}",
            self.database_name, self.table_name, self.trigger_name
        )
    }
}

/// A registered trigger: the declaration resolved against settings, plus
/// the callable that runs when the trigger fires. Immutable once created.
#[derive(Clone)]
pub struct TriggerSpec {
    key: TriggerKey,
    definition: TriggerOperation,
    retry: Option<RetryOverrides>,
    handler: Arc<dyn EventHandler>,
}

impl TriggerSpec {
    pub fn key(&self) -> &TriggerKey {
        &self.key
    }

    pub fn definition(&self) -> &TriggerOperation {
        &self.definition
    }

    pub fn retry_overrides(&self) -> Option<&RetryOverrides> {
        self.retry.as_ref()
    }

    pub fn handler(&self) -> Arc<dyn EventHandler> {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for TriggerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerSpec")
            .field("key", &self.key)
            .field("definition", &self.definition)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Process-wide catalog mapping trigger keys to specs and callables
#[derive(Debug)]
pub struct HandlerRegistry {
    default_database: String,
    /// Declaration order, the canonical iteration order
    specs: Vec<TriggerSpec>,
    index: HashMap<TriggerKey, usize>,
}

impl HandlerRegistry {
    pub fn new(default_database: impl Into<String>) -> Self {
        Self {
            default_database: default_database.into(),
            specs: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a declared handler.
    ///
    /// Fails with [`MetadataError::DuplicateTrigger`] if the resolved key is
    /// already taken, and with [`MetadataError::Validation`] if the
    /// declaration is malformed. The registry is left unchanged on failure.
    pub fn register(
        &mut self,
        declaration: TriggerDeclaration,
        handler: Arc<dyn EventHandler>,
    ) -> Result<&TriggerSpec> {
        declaration
            .validate()
            .map_err(|e| MetadataError::Validation(e.to_string()))?;

        let key = TriggerKey::new(
            declaration
                .database_name
                .clone()
                .unwrap_or_else(|| self.default_database.clone()),
            declaration.table_name.clone(),
            declaration.trigger_name.clone(),
        );

        if self.index.contains_key(&key) {
            return Err(MetadataError::DuplicateTrigger {
                database: key.database_name,
                table: key.table_name,
                trigger: key.trigger_name,
            });
        }

        debug!("Registered trigger handler {}", key);

        let spec = TriggerSpec {
            key: key.clone(),
            definition: declaration.definition,
            retry: declaration.retry_config,
            handler,
        };
        self.specs.push(spec);
        self.index.insert(key, self.specs.len() - 1);
        Ok(self.specs.last().expect("just pushed"))
    }

    /// Look up the callable for a trigger key (dispatch path)
    pub fn lookup(&self, key: &TriggerKey) -> Result<Arc<dyn EventHandler>> {
        self.get(key)
            .map(TriggerSpec::handler)
            .ok_or_else(|| MetadataError::UnknownTrigger {
                database: key.database_name.clone(),
                table: key.table_name.clone(),
                trigger: key.trigger_name.clone(),
            })
    }

    /// Fetch a registered spec, if any
    pub fn get(&self, key: &TriggerKey) -> Option<&TriggerSpec> {
        self.index.get(key).map(|&i| &self.specs[i])
    }

    /// All specs grouped by database name.
    ///
    /// Databases come out in sorted order, specs within a database in
    /// declaration order. Both orders are deterministic so repeated
    /// reconciliation passes write byte-identical documents.
    pub fn all_by_database(&self) -> BTreeMap<String, Vec<&TriggerSpec>> {
        let mut by_database: BTreeMap<String, Vec<&TriggerSpec>> = BTreeMap::new();
        for spec in &self.specs {
            by_database
                .entry(spec.key.database_name.clone())
                .or_default()
                .push(spec);
        }
        by_database
    }

    /// Clear all registrations (test isolation)
    pub fn reset(&mut self) {
        self.specs.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::declaration::{OperationType, TriggerOperation};

    fn noop_handler() -> Arc<dyn EventHandler> {
        FnHandler::new(|_event| async { Ok(()) })
    }

    fn declaration(database: Option<&str>, table: &str, trigger: &str) -> TriggerDeclaration {
        TriggerDeclaration {
            database_name: database.map(str::to_string),
            table_name: table.to_string(),
            trigger_name: trigger.to_string(),
            definition: TriggerOperation::all_columns(OperationType::Insert),
            retry_config: None,
        }
    }

    #[test]
    fn resolves_default_database() {
        let mut registry = HandlerRegistry::new("default");
        registry
            .register(declaration(None, "orders", "orders_on_insert"), noop_handler())
            .unwrap();

        let key = TriggerKey::new("default", "orders", "orders_on_insert");
        assert!(registry.get(&key).is_some());
    }

    #[test]
    fn rejects_duplicate_key_and_leaves_registry_unchanged() {
        let mut registry = HandlerRegistry::new("default");
        registry
            .register(declaration(None, "orders", "orders_on_insert"), noop_handler())
            .unwrap();

        let err = registry
            .register(declaration(Some("default"), "orders", "orders_on_insert"), noop_handler())
            .unwrap_err();

        assert!(matches!(err, MetadataError::DuplicateTrigger { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_invalid_declaration() {
        let mut registry = HandlerRegistry::new("default");
        let err = registry
            .register(declaration(None, "bad table", "t"), noop_handler())
            .unwrap_err();

        assert!(matches!(err, MetadataError::Validation(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_miss_is_unknown_trigger() {
        let registry = HandlerRegistry::new("default");
        let err = registry
            .lookup(&TriggerKey::new("default", "orders", "nope"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::UnknownTrigger { .. }));
    }

    #[test]
    fn iterates_in_declaration_order_grouped_by_database() {
        let mut registry = HandlerRegistry::new("default");
        registry
            .register(declaration(Some("zeta"), "t1", "z_first"), noop_handler())
            .unwrap();
        registry
            .register(declaration(None, "t2", "d_first"), noop_handler())
            .unwrap();
        registry
            .register(declaration(Some("zeta"), "t1", "z_second"), noop_handler())
            .unwrap();

        let grouped = registry.all_by_database();
        let databases: Vec<&String> = grouped.keys().collect();
        assert_eq!(databases, ["default", "zeta"]);

        let zeta: Vec<&str> = grouped["zeta"]
            .iter()
            .map(|s| s.key().trigger_name.as_str())
            .collect();
        assert_eq!(zeta, ["z_first", "z_second"]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut registry = HandlerRegistry::new("default");
        registry
            .register(declaration(None, "orders", "orders_on_insert"), noop_handler())
            .unwrap();
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.all_by_database().is_empty());
    }
}
