//! Projected views: the permission-narrowed shape of a schema for one
//! principal, and the machinery to read concrete records through it.

use serde_json::{Map, Value};

use crate::error::{VisibilityError, VisibilityResult};

/// How one projected field renders when a record is read through the view.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    /// Scalar or computed value, passed through as-is
    Value,
    /// Relation collapsed to the target record's identifier
    Reference { target: String, key_field: String },
    /// Relation expanded into a nested permission-narrowed view
    Nested(ProjectedView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedField {
    pub name: String,
    pub shape: FieldShape,
}

/// The recursively computed, permission-narrowed shape of a schema.
/// Field order is deterministic: primary identifier first, then the
/// schema's declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedView {
    pub schema_name: String,
    pub fields: Vec<ProjectedField>,
}

impl ProjectedView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ProjectedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Reads a record's values through the view, in view order.
    ///
    /// Every projected field must be present on the record; a missing
    /// attribute is a configuration error naming the field and schema.
    pub fn apply_to(&self, record: &Value) -> VisibilityResult<Vec<(String, Value)>> {
        let object = record.as_object().ok_or_else(|| {
            VisibilityError::InvalidData(format!(
                "record for schema {} is not an object",
                self.schema_name
            ))
        })?;

        let mut out = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value =
                object
                    .get(&field.name)
                    .ok_or_else(|| VisibilityError::MissingAttribute {
                        schema_name: self.schema_name.clone(),
                        field_name: field.name.clone(),
                    })?;
            out.push((field.name.clone(), self.render(field, value)?));
        }
        Ok(out)
    }

    /// Like [`apply_to`](Self::apply_to), returning a JSON object.
    pub fn apply_to_json(&self, record: &Value) -> VisibilityResult<Value> {
        Ok(pairs_to_object(self.apply_to(record)?))
    }

    fn render(&self, field: &ProjectedField, value: &Value) -> VisibilityResult<Value> {
        match &field.shape {
            FieldShape::Value => Ok(value.clone()),
            FieldShape::Reference { target, key_field } => {
                collapse_reference(value, target, key_field)
            }
            FieldShape::Nested(view) => match value {
                Value::Array(items) => {
                    let mut rendered = Vec::with_capacity(items.len());
                    for item in items {
                        rendered.push(view.apply_to_json(item)?);
                    }
                    Ok(Value::Array(rendered))
                }
                Value::Object(_) => view.apply_to_json(value),
                Value::Null => Ok(Value::Null),
                _ => Err(VisibilityError::MissingAttribute {
                    schema_name: view.schema_name.clone(),
                    field_name: field.name.clone(),
                }),
            },
        }
    }
}

/// Collapses a relation value to the target's identifier: objects yield
/// their key field, arrays collapse element-wise, and scalars are passed
/// through as an already-collapsed identifier.
fn collapse_reference(value: &Value, target: &str, key_field: &str) -> VisibilityResult<Value> {
    match value {
        Value::Object(object) => object.get(key_field).cloned().ok_or_else(|| {
            VisibilityError::MissingAttribute {
                schema_name: target.to_string(),
                field_name: key_field.to_string(),
            }
        }),
        Value::Array(items) => {
            let mut collapsed = Vec::with_capacity(items.len());
            for item in items {
                collapsed.push(collapse_reference(item, target, key_field)?);
            }
            Ok(Value::Array(collapsed))
        }
        other => Ok(other.clone()),
    }
}

fn pairs_to_object(pairs: Vec<(String, Value)>) -> Value {
    let mut object = Map::new();
    for (name, value) in pairs {
        object.insert(name, value);
    }
    Value::Object(object)
}
