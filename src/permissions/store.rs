//! Permission storage interface and the bundled in-memory implementation.
//!
//! The engine only ever reads grants and row filters; creating and deleting
//! them is administrative action that happens elsewhere. `PermissionStore`
//! is the seam a persistence-backed implementation plugs into.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::error::{VisibilityError, VisibilityResult};
use crate::permissions::types::{FieldGrant, RowFilterRecord};

/// Read access to stored field grants and row filters.
pub trait PermissionStore {
    /// Field names granted to a principal on a schema. An empty set means
    /// the principal sees nothing of that schema.
    fn grants_for(
        &self,
        principal_id: &str,
        schema_name: &str,
    ) -> VisibilityResult<BTreeSet<String>>;

    /// The principal's stored encoded row filter for a schema, if any.
    /// `None` means unrestricted row visibility.
    fn row_filter_for(
        &self,
        principal_id: &str,
        schema_name: &str,
    ) -> VisibilityResult<Option<String>>;
}

/// In-memory permission store.
///
/// Used by tests and by embedders that load grants from elsewhere and hand
/// them to the engine wholesale. Keys are kept ordered so grant dumps are
/// stable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPermissionStore {
    grants: BTreeMap<(String, String), BTreeSet<String>>,
    filters: BTreeMap<(String, String), String>,
}

impl InMemoryPermissionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(
        &mut self,
        principal_id: impl Into<String>,
        schema_name: impl Into<String>,
        field_name: impl Into<String>,
    ) {
        self.grants
            .entry((principal_id.into(), schema_name.into()))
            .or_default()
            .insert(field_name.into());
    }

    pub fn revoke(&mut self, principal_id: &str, schema_name: &str, field_name: &str) {
        let key = (principal_id.to_string(), schema_name.to_string());
        if let Some(fields) = self.grants.get_mut(&key) {
            fields.remove(field_name);
            if fields.is_empty() {
                self.grants.remove(&key);
            }
        }
    }

    /// Stores a principal's row filter for a schema, replacing any previous
    /// one: at most one filter exists per (principal, schema) pair.
    pub fn set_row_filter(
        &mut self,
        principal_id: impl Into<String>,
        schema_name: impl Into<String>,
        expression: impl Into<String>,
    ) {
        self.filters
            .insert((principal_id.into(), schema_name.into()), expression.into());
    }

    pub fn clear_row_filter(&mut self, principal_id: &str, schema_name: &str) {
        self.filters
            .remove(&(principal_id.to_string(), schema_name.to_string()));
    }

    /// Serializes every grant as a stable JSON array, suitable for export
    /// and re-import with [`load_grants`](Self::load_grants).
    pub fn dump_grants(&self) -> VisibilityResult<String> {
        let grants: Vec<FieldGrant> = self
            .grants
            .iter()
            .flat_map(|((principal, schema), fields)| {
                fields
                    .iter()
                    .map(|field| FieldGrant::new(principal.clone(), schema.clone(), field.clone()))
            })
            .collect();
        serde_json::to_string(&grants)
            .map_err(|e| VisibilityError::InvalidData(format!("Failed to dump grants: {}", e)))
    }

    /// Applies grants from a JSON array produced by
    /// [`dump_grants`](Self::dump_grants). Existing grants are kept;
    /// duplicates collapse.
    pub fn load_grants(&mut self, dump: &str) -> VisibilityResult<()> {
        let grants: Vec<FieldGrant> = serde_json::from_str(dump)
            .map_err(|e| VisibilityError::InvalidData(format!("Failed to parse grants: {}", e)))?;
        debug!("Loading {} grants", grants.len());
        for grant in grants {
            self.grant(grant.principal_id, grant.schema_name, grant.field_name);
        }
        Ok(())
    }

    /// Serializes every stored row filter as a stable JSON array.
    pub fn dump_row_filters(&self) -> VisibilityResult<String> {
        let filters: Vec<RowFilterRecord> = self
            .filters
            .iter()
            .map(|((principal, schema), expression)| RowFilterRecord {
                principal_id: principal.clone(),
                schema_name: schema.clone(),
                expression: expression.clone(),
            })
            .collect();
        serde_json::to_string(&filters)
            .map_err(|e| VisibilityError::InvalidData(format!("Failed to dump row filters: {}", e)))
    }

    /// Applies row filters from a JSON array produced by
    /// [`dump_row_filters`](Self::dump_row_filters). Later entries replace
    /// earlier ones for the same (principal, schema) pair.
    pub fn load_row_filters(&mut self, dump: &str) -> VisibilityResult<()> {
        let filters: Vec<RowFilterRecord> = serde_json::from_str(dump).map_err(|e| {
            VisibilityError::InvalidData(format!("Failed to parse row filters: {}", e))
        })?;
        debug!("Loading {} row filters", filters.len());
        for filter in filters {
            self.set_row_filter(filter.principal_id, filter.schema_name, filter.expression);
        }
        Ok(())
    }
}

impl PermissionStore for InMemoryPermissionStore {
    fn grants_for(
        &self,
        principal_id: &str,
        schema_name: &str,
    ) -> VisibilityResult<BTreeSet<String>> {
        Ok(self
            .grants
            .get(&(principal_id.to_string(), schema_name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn row_filter_for(
        &self,
        principal_id: &str,
        schema_name: &str,
    ) -> VisibilityResult<Option<String>> {
        Ok(self
            .filters
            .get(&(principal_id.to_string(), schema_name.to_string()))
            .cloned())
    }
}
