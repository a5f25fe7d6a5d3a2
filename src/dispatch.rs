//! Webhook dispatch boundary
//!
//! Typed payload delivered when a trigger fires, and the lookup path the
//! HTTP layer uses to route a verified callback to its handler. Secret
//! header verification happens upstream; by the time an event reaches
//! [`dispatch`] it is trusted.

use crate::error::Result;
use crate::registry::{HandlerRegistry, TriggerKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Operation that produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventOp {
    Insert,
    Update,
    Delete,
    Manual,
}

/// Row images around the operation. `old` is absent on insert,
/// `new` is absent on delete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<serde_json::Value>,
}

/// One fired trigger event, as delivered to a handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub op: EventOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_variables: Option<HashMap<String, String>>,
    #[serde(default)]
    pub data: EventData,
}

impl TriggerEvent {
    /// Build a fresh event for the given operation
    pub fn new(op: EventOp, data: EventData) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            op,
            session_variables: None,
            data,
        }
    }
}

/// Route a verified trigger callback to its registered handler.
///
/// Fails with [`crate::error::MetadataError::UnknownTrigger`] when no
/// handler owns the key; callers surface that as a rejected delivery.
pub async fn dispatch(
    registry: &HandlerRegistry,
    database_name: &str,
    table_name: &str,
    trigger_name: &str,
    event: TriggerEvent,
) -> Result<()> {
    let key = TriggerKey::new(database_name, table_name, trigger_name);
    let handler = registry.lookup(&key)?;
    debug!("Dispatching event {} to {}", event.id, key);
    handler.handle(event).await
}
