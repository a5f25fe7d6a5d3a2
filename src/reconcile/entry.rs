//! Desired event-trigger entries
//!
//! Computes the on-disk form of a registered trigger. The webhook endpoint
//! and secret header are written as environment-variable *references*
//! (`webhook_from_env`, `value_from_env`), never resolved values, so
//! committed metadata carries no live secrets.

use crate::config::Settings;
use crate::registry::{OperationType, TriggerSpec};
use serde_yaml::{Mapping, Sequence, Value};

/// Name an existing entry is matched on
pub(crate) fn entry_name(entry: &Value) -> Option<&str> {
    entry.as_mapping()?.get("name")?.as_str()
}

/// Compute the desired entry for a spec.
///
/// Canonical key order: name, definition, retry_conf, webhook_from_env,
/// headers.
pub(crate) fn desired_entry(spec: &TriggerSpec, settings: &Settings) -> Value {
    let metadata = &settings.metadata;

    let mut entry = Mapping::new();
    entry.insert("name".into(), spec.key().trigger_name.clone().into());
    entry.insert("definition".into(), definition_value(spec));
    entry.insert("retry_conf".into(), retry_value(spec, settings));
    entry.insert(
        "webhook_from_env".into(),
        metadata.endpoint_env_name.clone().into(),
    );
    entry.insert("headers".into(), headers_value(settings));
    Value::Mapping(entry)
}

fn definition_value(spec: &TriggerSpec) -> Value {
    let definition = spec.definition();

    let mut out = Mapping::new();
    out.insert(
        "enable_manual".into(),
        Value::Bool(definition.kind == OperationType::Manual),
    );
    if definition.kind != OperationType::Manual {
        let mut operation = Mapping::new();
        operation.insert("columns".into(), columns_value(definition.columns.as_deref()));
        out.insert(definition.kind.as_str().into(), Value::Mapping(operation));
    }
    Value::Mapping(out)
}

fn columns_value(columns: Option<&[String]>) -> Value {
    match columns {
        None => "*".into(),
        Some(columns) => Value::Sequence(
            columns
                .iter()
                .map(|column| Value::from(column.clone()))
                .collect(),
        ),
    }
}

fn retry_value(spec: &TriggerSpec, settings: &Settings) -> Value {
    let resolved = spec
        .retry_overrides()
        .copied()
        .unwrap_or_default()
        .resolve(&settings.metadata.default_retry);

    // Written as integers; the comparison side makes the same promise
    let mut out = Mapping::new();
    out.insert("interval_sec".into(), Value::from(u64::from(resolved.interval_seconds)));
    out.insert("num_retries".into(), Value::from(u64::from(resolved.num_retries)));
    out.insert("timeout_sec".into(), Value::from(u64::from(resolved.timeout_seconds)));
    out.insert(
        "tolerance_seconds".into(),
        Value::from(u64::from(resolved.tolerance_seconds)),
    );
    Value::Mapping(out)
}

fn headers_value(settings: &Settings) -> Value {
    let mut header = Mapping::new();
    header.insert("name".into(), settings.webhook.secret_header.clone().into());
    header.insert(
        "value_from_env".into(),
        settings.metadata.secret_header_env_name.clone().into(),
    );

    let mut headers = Sequence::new();
    headers.push(Value::Mapping(header));
    Value::Sequence(headers)
}
