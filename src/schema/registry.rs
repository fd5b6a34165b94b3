//! Schema registry: the engine's read-only source of record type metadata.
//!
//! The registry is built once at startup (from code or from JSON schema
//! definitions) and injected into the projector and enforcer. It replaces
//! any module-level lookup tables with an explicit instance whose lifecycle
//! the embedding application controls.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::error::{VisibilityError, VisibilityResult};
use crate::schema::types::Schema;

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its own name. Re-registering a name replaces
    /// the previous entry.
    pub fn register(&mut self, schema: Schema) {
        debug!("Registering schema '{}'", schema.name);
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, name: &str) -> VisibilityResult<&Schema> {
        self.schemas
            .get(name)
            .ok_or_else(|| VisibilityError::NotFound(format!("Schema {} not found", name)))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    #[must_use]
    pub fn schema_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.keys().cloned().collect();
        names.sort();
        names
    }

    /// Builds a registry from a JSON array of schema definitions.
    pub fn from_json_str(definitions: &str) -> VisibilityResult<Self> {
        let schemas: Vec<Schema> = serde_json::from_str(definitions).map_err(|e| {
            VisibilityError::InvalidData(format!("Failed to parse schema definitions: {}", e))
        })?;
        let mut registry = Self::new();
        for schema in schemas {
            registry.register(schema);
        }
        Ok(registry)
    }

    /// Enumerates every registered schema's field names in projection order,
    /// keyed by schema name. This is the candidate-field listing that grant
    /// administration tooling works from.
    #[must_use]
    pub fn permitted_fields(&self) -> BTreeMap<String, Vec<String>> {
        self.schemas
            .values()
            .map(|schema| {
                let names = schema
                    .fields_in_view_order()
                    .iter()
                    .map(|f| f.name.clone())
                    .collect();
                (schema.name.clone(), names)
            })
            .collect()
    }
}
