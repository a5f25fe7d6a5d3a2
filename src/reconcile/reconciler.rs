//! Trigger Reconciler
//!
//! Pure in-memory merge of desired trigger entries into a table document.
//! Additive only: entries the registry does not own are never touched, let
//! alone deleted, because hand-authored triggers legitimately coexist with
//! managed ones.

use crate::config::Settings;
use crate::error::{invalid_definition, Result};
use crate::metadata::TableDocument;
use crate::reconcile::entry::{desired_entry, entry_name};
use crate::registry::{OperationType, TriggerSpec};
use serde_yaml::Value;

/// Merge the given specs into the document's trigger section.
///
/// Returns whether the document changed. For each spec in order: a missing
/// entry is appended, a semantically equal entry is left untouched, a
/// differing entry is replaced in place so it keeps its position. Running
/// the same merge twice therefore reports no change the second time.
pub fn reconcile(
    document: &mut TableDocument,
    specs: &[&TriggerSpec],
    settings: &Settings,
) -> Result<bool> {
    let mut changed = false;

    for spec in specs {
        validate_column_filter(document, spec)?;

        let desired = desired_entry(spec, settings);
        let name = spec.key().trigger_name.clone();

        let triggers = document.event_triggers_mut();
        match triggers
            .iter()
            .position(|existing| entry_name(existing) == Some(name.as_str()))
        {
            None => {
                triggers.push(desired);
                changed = true;
            }
            Some(i) => {
                if !semantically_equal(&triggers[i], &desired) {
                    triggers[i] = desired;
                    changed = true;
                }
            }
        }
    }

    Ok(changed)
}

/// Deep structural equality ignoring mapping key order.
///
/// Numbers are compared as integers when both sides are integral; a float
/// written where an integer belongs counts as a difference, so it gets
/// rewritten in integer form.
pub(crate) fn semantically_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Mapping(ma), Value::Mapping(mb)) => {
            ma.len() == mb.len()
                && ma
                    .iter()
                    .all(|(k, va)| mb.get(k).is_some_and(|vb| semantically_equal(va, vb)))
        }
        (Value::Sequence(sa), Value::Sequence(sb)) => {
            sa.len() == sb.len()
                && sa
                    .iter()
                    .zip(sb.iter())
                    .all(|(va, vb)| semantically_equal(va, vb))
        }
        (Value::Number(na), Value::Number(nb)) => match (na.as_i64(), nb.as_i64()) {
            (Some(ia), Some(ib)) => ia == ib,
            _ => na == nb,
        },
        _ => a == b,
    }
}

fn validate_column_filter(document: &TableDocument, spec: &TriggerSpec) -> Result<()> {
    let Some(filter) = spec.definition().columns.as_ref() else {
        return Ok(());
    };
    let trigger = &spec.key().trigger_name;

    if spec.definition().kind == OperationType::Manual {
        return Err(invalid_definition(trigger, "manual triggers cannot filter columns"));
    }
    if filter.is_empty() {
        return Err(invalid_definition(trigger, "column filter is empty"));
    }

    // Only validated when the document itself declares columns
    if let Some(declared) = document.declared_columns() {
        for column in filter {
            if !declared.iter().any(|d| d == column) {
                return Err(invalid_definition(
                    trigger,
                    format!("column '{column}' is not declared by the table document"),
                ));
            }
        }
    }

    Ok(())
}
