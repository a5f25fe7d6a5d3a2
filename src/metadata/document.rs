//! Table metadata documents
//!
//! A structured YAML tree addressed by (database, table). Everything in the
//! document belongs to its human maintainers except the `event_triggers`
//! sequence, which the reconciler owns. The wrapper keeps the raw mapping
//! intact so unrelated sections survive a rewrite structurally unchanged.

use serde_yaml::{Mapping, Sequence, Value};
use sha2::{Digest, Sha256};

/// Key of the one section the reconciler may rewrite
pub const EVENT_TRIGGERS_KEY: &str = "event_triggers";

/// Schema all managed tables live in, also the file-name prefix
pub const DEFAULT_SCHEMA: &str = "public";

/// One table's metadata document
#[derive(Debug, Clone, PartialEq)]
pub struct TableDocument {
    database_name: String,
    table_name: String,
    root: Mapping,
}

impl TableDocument {
    pub fn new(
        database_name: impl Into<String>,
        table_name: impl Into<String>,
        root: Mapping,
    ) -> Self {
        Self {
            database_name: database_name.into(),
            table_name: table_name.into(),
            root,
        }
    }

    /// Minimal document for a table that has no metadata file yet:
    /// table identity plus an empty trigger list.
    pub fn skeleton(database_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        let database_name = database_name.into();
        let table_name = table_name.into();

        let mut table = Mapping::new();
        table.insert("schema".into(), DEFAULT_SCHEMA.into());
        table.insert("name".into(), table_name.clone().into());

        let mut root = Mapping::new();
        root.insert("table".into(), Value::Mapping(table));
        root.insert(EVENT_TRIGGERS_KEY.into(), Value::Sequence(Sequence::new()));

        Self {
            database_name,
            table_name,
            root,
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// The trigger section, if the document has one
    pub fn event_triggers(&self) -> Option<&Sequence> {
        self.root.get(EVENT_TRIGGERS_KEY).and_then(Value::as_sequence)
    }

    /// The trigger section, created empty at the end of the document when
    /// missing
    pub fn event_triggers_mut(&mut self) -> &mut Sequence {
        let needs_section = !matches!(self.root.get(EVENT_TRIGGERS_KEY), Some(Value::Sequence(_)));
        if needs_section {
            self.root.insert(
                EVENT_TRIGGERS_KEY.into(),
                Value::Sequence(Sequence::new()),
            );
        }
        self.root
            .get_mut(EVENT_TRIGGERS_KEY)
            .and_then(Value::as_sequence_mut)
            .expect("event_triggers section just ensured")
    }

    /// Columns the document declares, when it declares any.
    ///
    /// Two shapes count as a declaration: a top-level `columns` sequence
    /// (plain names or mappings with a `name` key), or the keys of
    /// `configuration.custom_column_names`. Returns `None` when the
    /// document stays silent about its columns.
    pub fn declared_columns(&self) -> Option<Vec<String>> {
        if let Some(seq) = self.root.get("columns").and_then(Value::as_sequence) {
            let columns = seq
                .iter()
                .filter_map(|v| match v {
                    Value::String(name) => Some(name.clone()),
                    Value::Mapping(m) => m.get("name").and_then(Value::as_str).map(str::to_string),
                    _ => None,
                })
                .collect();
            return Some(columns);
        }

        if let Some(custom) = self
            .root
            .get("configuration")
            .and_then(Value::as_mapping)
            .and_then(|m| m.get("custom_column_names"))
            .and_then(Value::as_mapping)
        {
            return Some(
                custom
                    .keys()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            );
        }

        None
    }

    /// Serialize with canonical key ordering: `table` first (schema before
    /// name), every other key in its existing position. Entries are never
    /// reordered, which keeps source-control diffs minimal.
    pub fn to_canonical_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.canonical_root())
    }

    /// Content checksum of the canonical serialization
    pub fn fingerprint(&self) -> Result<String, serde_yaml::Error> {
        Ok(fingerprint_of(&self.to_canonical_yaml()?))
    }

    fn canonical_root(&self) -> Mapping {
        let mut out = Mapping::new();
        if let Some(table) = self.root.get("table") {
            out.insert("table".into(), canonical_table(table));
        }
        for (key, value) in &self.root {
            if key.as_str() == Some("table") {
                continue;
            }
            out.insert(key.clone(), value.clone());
        }
        out
    }
}

fn canonical_table(value: &Value) -> Value {
    let Some(table) = value.as_mapping() else {
        return value.clone();
    };

    let mut out = Mapping::new();
    if let Some(schema) = table.get("schema") {
        out.insert("schema".into(), schema.clone());
    }
    if let Some(name) = table.get("name") {
        out.insert("name".into(), name.clone());
    }
    for (key, v) in table {
        if matches!(key.as_str(), Some("schema") | Some("name")) {
            continue;
        }
        out.insert(key.clone(), v.clone());
    }
    Value::Mapping(out)
}

/// Hex sha256 of serialized document content
pub(crate) fn fingerprint_of(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn skeleton_has_identity_and_empty_trigger_list() {
        let doc = TableDocument::skeleton("default", "orders");
        let yaml = doc.to_canonical_yaml().unwrap();
        let expected = "table:\n  schema: public\n  name: orders\nevent_triggers: []\n";
        assert_eq!(yaml, expected);
    }

    #[test]
    fn canonical_order_puts_table_first_schema_before_name() {
        let root = parse(
            "select_permissions:\n- role: user\ntable:\n  name: orders\n  schema: public\n",
        );
        let doc = TableDocument::new("default", "orders", root);
        let yaml = doc.to_canonical_yaml().unwrap();
        assert!(yaml.starts_with("table:\n  schema: public\n  name: orders\n"));
        assert!(yaml.contains("select_permissions"));
    }

    #[test]
    fn event_triggers_mut_appends_section_at_end() {
        let root = parse("table:\n  schema: public\n  name: orders\n");
        let mut doc = TableDocument::new("default", "orders", root);
        assert!(doc.event_triggers().is_none());

        doc.event_triggers_mut();
        let yaml = doc.to_canonical_yaml().unwrap();
        assert!(yaml.ends_with("event_triggers: []\n"));
    }

    #[test]
    fn declared_columns_from_sequence() {
        let root = parse("table:\n  name: orders\ncolumns:\n- id\n- name: total\n  type: numeric\n");
        let doc = TableDocument::new("default", "orders", root);
        assert_eq!(doc.declared_columns(), Some(vec!["id".to_string(), "total".to_string()]));
    }

    #[test]
    fn declared_columns_from_custom_column_names() {
        let root = parse(
            "table:\n  name: orders\nconfiguration:\n  custom_column_names:\n    created_at: createdAt\n",
        );
        let doc = TableDocument::new("default", "orders", root);
        assert_eq!(doc.declared_columns(), Some(vec!["created_at".to_string()]));
    }

    #[test]
    fn no_column_declaration_returns_none() {
        let root = parse("table:\n  name: orders\n");
        let doc = TableDocument::new("default", "orders", root);
        assert_eq!(doc.declared_columns(), None);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut doc = TableDocument::skeleton("default", "orders");
        let before = doc.fingerprint().unwrap();
        doc.event_triggers_mut().push("entry".into());
        let after = doc.fingerprint().unwrap();
        assert_ne!(before, after);
    }
}
