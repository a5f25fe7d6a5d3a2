//! Triggerflow - managed event-trigger metadata
//!
//! Declare webhook-backed database trigger handlers in code; at startup a
//! reconciliation pass merges the implied configuration into checked-in
//! YAML metadata documents, idempotently and without clobbering anything
//! hand-authored.
//!
//! The moving parts, in data-flow order:
//! - Components register [`registry::TriggerDeclaration`]s (plus their
//!   callables) into a [`registry::HandlerRegistry`]
//! - The [`reconcile::ReconciliationDriver`] loads each affected table
//!   document from the [`metadata::MetadataStore`], merges the desired
//!   trigger entries, and writes back only what changed
//! - Later, the webhook layer routes verified callbacks through
//!   [`dispatch::dispatch`] to the registered handler
//!
//! ```no_run
//! use std::sync::Arc;
//! use triggerflow::config::Settings;
//! use triggerflow::metadata::MetadataStore;
//! use triggerflow::reconcile::ReconciliationDriver;
//! use triggerflow::registry::{
//!     FnHandler, HandlerRegistry, OperationType, TriggerDeclaration, TriggerOperation,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let settings = Settings::from_env()?;
//! let mut registry = HandlerRegistry::new(&settings.metadata.default_database);
//!
//! registry.register(
//!     TriggerDeclaration {
//!         database_name: None,
//!         table_name: "orders".to_string(),
//!         trigger_name: "orders_on_insert".to_string(),
//!         definition: TriggerOperation::all_columns(OperationType::Insert),
//!         retry_config: None,
//!     },
//!     FnHandler::new(|event| async move {
//!         tracing::info!("order inserted: {}", event.id);
//!         Ok(())
//!     }),
//! )?;
//!
//! let store = MetadataStore::new(&settings.metadata.dir_path);
//! let summary = ReconciliationDriver::new()
//!     .run(&registry, &store, &settings)
//!     .await?;
//! println!("{} document(s) written", summary.documents_written);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod metadata;
pub mod reconcile;
pub mod registry;

pub use config::Settings;
pub use dispatch::{dispatch, TriggerEvent};
pub use error::{MetadataError, Result};
pub use metadata::{MetadataStore, TableDocument};
pub use reconcile::{ReconciliationDriver, ReconciliationSummary};
pub use registry::{HandlerRegistry, TriggerKey, TriggerSpec};
