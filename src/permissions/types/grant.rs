use serde::{Deserialize, Serialize};

/// One field of one schema made visible to one principal.
///
/// Grants form a set per (principal, schema) pair; duplicates collapse.
/// Absence of any grant means zero visible fields for that schema, not
/// "all fields".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldGrant {
    pub principal_id: String,
    pub schema_name: String,
    pub field_name: String,
}

impl FieldGrant {
    #[must_use]
    pub fn new(
        principal_id: impl Into<String>,
        schema_name: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            principal_id: principal_id.into(),
            schema_name: schema_name.into(),
            field_name: field_name.into(),
        }
    }
}

/// A principal's stored row filter for one schema: at most one encoded
/// predicate per (principal, schema) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFilterRecord {
    pub principal_id: String,
    pub schema_name: String,
    pub expression: String,
}
