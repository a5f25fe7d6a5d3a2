//! Handler callables and the registration boundary
//!
//! Replaces annotation scanning: components hand their declarations and
//! callables to `build_registry` explicitly at startup, before the
//! reconciliation driver runs.

use crate::dispatch::TriggerEvent;
use crate::error::Result;
use crate::registry::declaration::TriggerDeclaration;
use crate::registry::HandlerRegistry;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// A callable invoked when its trigger fires
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: TriggerEvent) -> Result<()>;
}

impl std::fmt::Debug for dyn EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventHandler")
    }
}

/// Adapter wrapping an async closure as an [`EventHandler`]
pub struct FnHandler<F> {
    inner: F,
}

impl<F> FnHandler<F> {
    pub fn new<Fut>(f: F) -> Arc<dyn EventHandler>
    where
        F: Fn(TriggerEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Arc::new(Self { inner: f })
    }
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(TriggerEvent) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn handle(&self, event: TriggerEvent) -> Result<()> {
        (self.inner)(event).await
    }
}

/// Implemented by components that own trigger handlers.
///
/// The returned order is the declaration order; it determines iteration
/// order everywhere downstream, so keep it stable.
pub trait TriggerHandlerProvider {
    fn trigger_handlers(&self) -> Vec<(TriggerDeclaration, Arc<dyn EventHandler>)>;
}

/// Build a registry from an explicit provider list.
///
/// Providers are visited in slice order, declarations in the order each
/// provider returns them. Fails fast on the first duplicate or invalid
/// declaration, since both are startup-fatal.
pub fn build_registry(
    default_database: impl Into<String>,
    providers: &[&dyn TriggerHandlerProvider],
) -> Result<HandlerRegistry> {
    let mut registry = HandlerRegistry::new(default_database);
    for provider in providers {
        for (declaration, handler) in provider.trigger_handlers() {
            registry.register(declaration, handler)?;
        }
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::registry::declaration::{OperationType, TriggerOperation};
    use crate::registry::TriggerKey;

    struct OrdersService;

    impl TriggerHandlerProvider for OrdersService {
        fn trigger_handlers(&self) -> Vec<(TriggerDeclaration, Arc<dyn EventHandler>)> {
            vec![
                (
                    TriggerDeclaration {
                        database_name: None,
                        table_name: "orders".to_string(),
                        trigger_name: "orders_on_insert".to_string(),
                        definition: TriggerOperation::all_columns(OperationType::Insert),
                        retry_config: None,
                    },
                    FnHandler::new(|_| async { Ok(()) }),
                ),
                (
                    TriggerDeclaration {
                        database_name: None,
                        table_name: "orders".to_string(),
                        trigger_name: "orders_on_delete".to_string(),
                        definition: TriggerOperation::all_columns(OperationType::Delete),
                        retry_config: None,
                    },
                    FnHandler::new(|_| async { Ok(()) }),
                ),
            ]
        }
    }

    #[test]
    fn collects_providers_in_order() {
        let service = OrdersService;
        let registry = build_registry("default", &[&service]).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry
            .get(&TriggerKey::new("default", "orders", "orders_on_insert"))
            .is_some());

        let grouped = registry.all_by_database();
        let names: Vec<&str> = grouped["default"]
            .iter()
            .map(|s| s.key().trigger_name.as_str())
            .collect();
        assert_eq!(names, ["orders_on_insert", "orders_on_delete"]);
    }

    #[test]
    fn fails_fast_when_two_providers_claim_one_trigger() {
        let first = OrdersService;
        let second = OrdersService;
        let err = build_registry("default", &[&first, &second]).unwrap_err();
        assert!(matches!(err, MetadataError::DuplicateTrigger { .. }));
    }
}
