use serde::{Deserialize, Serialize};

/// Kind of a declared schema field.
///
/// Relation fields carry the name of the schema they point at and a
/// `governed` capability marker: only permission-governed relations expand
/// into nested permission-narrowed views; ungoverned relations always render
/// as a plain reference to the target record's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Plain stored value
    Scalar,
    /// Method-backed value computed at read time; treated like a scalar
    /// when projecting and reading records
    Computed,
    /// Reference to another schema's records
    Relation { target: String, governed: bool },
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Scalar
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
}

impl SchemaField {
    #[must_use]
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar,
        }
    }

    #[must_use]
    pub fn computed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Computed,
        }
    }

    #[must_use]
    pub fn relation(name: impl Into<String>, target: impl Into<String>, governed: bool) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Relation {
                target: target.into(),
                governed,
            },
        }
    }

    #[must_use]
    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Relation { .. })
    }

    /// Target schema name for relation fields, `None` otherwise.
    #[must_use]
    pub fn relation_target(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Relation { target, .. } => Some(target),
            _ => None,
        }
    }
}
