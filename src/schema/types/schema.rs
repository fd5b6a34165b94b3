use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::fields::SchemaField;

/// Record type metadata: a stable `namespace.name` identifier, the primary
/// identifier field, and the declared fields in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub primary_key: String,
    pub fields: Vec<SchemaField>,
}

impl Schema {
    #[must_use]
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            fields: Vec::new(),
        }
    }

    pub fn add_field(&mut self, field: SchemaField) {
        self.fields.push(field);
    }

    #[must_use]
    pub fn with_field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All declared field names, including the primary key and any computed
    /// or relation fields.
    #[must_use]
    pub fn declared_names(&self) -> BTreeSet<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Fields in projection order: the primary identifier first, then the
    /// remaining fields in declaration order.
    #[must_use]
    pub fn fields_in_view_order(&self) -> Vec<&SchemaField> {
        let mut ordered = Vec::with_capacity(self.fields.len());
        if let Some(pk) = self.fields.iter().find(|f| f.name == self.primary_key) {
            ordered.push(pk);
        }
        ordered.extend(self.fields.iter().filter(|f| f.name != self.primary_key));
        ordered
    }
}
