//! Lossless two-way conversion between predicate trees and storable text.
//!
//! The wire form is a JSON object per group, `{"children": [...],
//! "connector": "AND"|"OR", "negated": bool}`, with leaf children as
//! 2-element arrays of key and value. Map keys serialize sorted, so the same
//! logical tree always encodes to the same bytes. An optional base64 wrap
//! makes the text safe for storage columns that mangle raw JSON.
//!
//! Temporal `range` bounds are normalized to integer seconds since epoch at
//! encode time and reconstructed as UTC instants at decode time. Open range
//! bounds are replaced by sentinel instants; the sentinels are a documented,
//! deliberate approximation of "unbounded", not true open-range semantics.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde_json::{Map, Value};

use crate::error::{VisibilityError, VisibilityResult};
use crate::filter::predicate::{Connector, Leaf, LeafValue, Predicate, PredicateNode, TimeRange};

/// Sentinel timestamp substituted for an open lower range bound: the Unix
/// epoch, a minimum that is representable on every platform the encoded
/// form may travel to.
pub const RANGE_MIN_TS: i64 = 0;

/// Sentinel timestamp substituted for an open upper range bound:
/// 3000-01-01T00:00:00Z.
pub const RANGE_MAX_TS: i64 = 32_503_680_000;

/// The instant open lower bounds canonicalize to.
#[must_use]
pub fn min_instant() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// The instant open upper bounds canonicalize to.
#[must_use]
pub fn max_instant() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(RANGE_MAX_TS)
}

/// Stateless predicate codec. Two instances configured alike produce
/// identical encodes and structurally identical decodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionCodec {
    wrap_base64: bool,
}

impl ExpressionCodec {
    /// Codec producing plain JSON text.
    #[must_use]
    pub fn new() -> Self {
        Self { wrap_base64: false }
    }

    /// Codec wrapping the JSON text in standard base64.
    #[must_use]
    pub fn base64() -> Self {
        Self { wrap_base64: true }
    }

    /// Serializes a predicate tree to storable text.
    pub fn encode(&self, predicate: &Predicate) -> VisibilityResult<String> {
        let value = group_to_value(predicate)?;
        let text = value.to_string();
        if self.wrap_base64 {
            Ok(general_purpose::STANDARD.encode(text))
        } else {
            Ok(text)
        }
    }

    /// Validates an arbitrary JSON value as a predicate tree and encodes it.
    /// A value that is not a well-formed group/leaf tree is rejected with
    /// `NotAPredicate`.
    pub fn encode_json(&self, value: &Value) -> VisibilityResult<String> {
        let predicate = group_from_value(value).map_err(|e| VisibilityError::NotAPredicate {
            reason: e.to_string(),
        })?;
        self.encode(&predicate)
    }

    /// Rebuilds a predicate tree from storable text.
    pub fn decode(&self, encoded: &str) -> VisibilityResult<Predicate> {
        let text = if self.wrap_base64 {
            let bytes = general_purpose::STANDARD.decode(encoded).map_err(|e| {
                VisibilityError::MalformedExpression {
                    reason: format!("invalid base64: {}", e),
                }
            })?;
            String::from_utf8(bytes).map_err(|e| VisibilityError::MalformedExpression {
                reason: format!("wrapped expression is not UTF-8: {}", e),
            })?
        } else {
            encoded.to_string()
        };

        let value: Value =
            serde_json::from_str(&text).map_err(|e| VisibilityError::MalformedExpression {
                reason: e.to_string(),
            })?;
        group_from_value(&value)
    }

    /// Replaces open range bounds with the documented sentinel instants.
    /// Leaves with native values pass through unchanged.
    #[must_use]
    pub fn canonicalize(leaf: &Leaf) -> Leaf {
        match &leaf.value {
            LeafValue::Range(range) => Leaf::new(
                leaf.key.clone(),
                LeafValue::Range(TimeRange::between(
                    range.lower.unwrap_or_else(min_instant),
                    range.upper.unwrap_or_else(max_instant),
                )),
            ),
            LeafValue::Json(_) => leaf.clone(),
        }
    }
}

fn group_to_value(predicate: &Predicate) -> VisibilityResult<Value> {
    let mut children = Vec::with_capacity(predicate.children.len());
    for child in &predicate.children {
        match child {
            PredicateNode::Group(group) => children.push(group_to_value(group)?),
            PredicateNode::Leaf(leaf) => children.push(leaf_to_value(leaf)?),
        }
    }

    let mut object = Map::new();
    object.insert(
        "connector".to_string(),
        Value::String(predicate.connector.as_str().to_string()),
    );
    object.insert("negated".to_string(), Value::Bool(predicate.negated));
    object.insert("children".to_string(), Value::Array(children));
    Ok(Value::Object(object))
}

fn leaf_to_value(leaf: &Leaf) -> VisibilityResult<Value> {
    if leaf.key.is_empty() {
        return Err(VisibilityError::NotAPredicate {
            reason: "leaf with empty key".to_string(),
        });
    }

    match &leaf.value {
        LeafValue::Json(value) => Ok(Value::Array(vec![
            Value::String(leaf.key.clone()),
            value.clone(),
        ])),
        LeafValue::Range(_) if leaf.lookup() != "range" => Err(VisibilityError::NotAPredicate {
            reason: format!("leaf '{}' carries range bounds without a range lookup", leaf.key),
        }),
        LeafValue::Range(range) => {
            let lower = range.lower.unwrap_or_else(min_instant);
            let upper = range.upper.unwrap_or_else(max_instant);
            if lower > upper {
                return Err(VisibilityError::NotAPredicate {
                    reason: format!("leaf '{}' has range bounds out of order", leaf.key),
                });
            }
            Ok(Value::Array(vec![
                Value::String(leaf.key.clone()),
                Value::Array(vec![
                    Value::from(lower.timestamp()),
                    Value::from(upper.timestamp()),
                ]),
            ]))
        }
    }
}

fn group_from_value(value: &Value) -> VisibilityResult<Predicate> {
    let object = value
        .as_object()
        .ok_or_else(|| VisibilityError::InvalidPredicateShape {
            missing: "group object".to_string(),
        })?;

    let connector = match object.get("connector").and_then(Value::as_str) {
        Some("AND") => Connector::And,
        Some("OR") => Connector::Or,
        Some(other) => {
            return Err(VisibilityError::MalformedExpression {
                reason: format!("unknown connector '{}'", other),
            })
        }
        None => {
            return Err(VisibilityError::InvalidPredicateShape {
                missing: "connector".to_string(),
            })
        }
    };

    let negated = object
        .get("negated")
        .and_then(Value::as_bool)
        .ok_or_else(|| VisibilityError::InvalidPredicateShape {
            missing: "negated".to_string(),
        })?;

    let raw_children = object
        .get("children")
        .and_then(Value::as_array)
        .ok_or_else(|| VisibilityError::InvalidPredicateShape {
            missing: "children".to_string(),
        })?;

    let mut children = Vec::with_capacity(raw_children.len());
    for child in raw_children {
        match child {
            Value::Object(_) => children.push(PredicateNode::Group(group_from_value(child)?)),
            Value::Array(parts) => children.push(PredicateNode::Leaf(leaf_from_parts(parts)?)),
            _ => {
                return Err(VisibilityError::InvalidPredicateShape {
                    missing: "group or 2-tuple leaf child".to_string(),
                })
            }
        }
    }

    Ok(Predicate {
        connector,
        negated,
        children,
    })
}

fn leaf_from_parts(parts: &[Value]) -> VisibilityResult<Leaf> {
    let [key, value] = parts else {
        return Err(VisibilityError::InvalidPredicateShape {
            missing: "2-tuple leaf child".to_string(),
        });
    };
    let key = key
        .as_str()
        .ok_or_else(|| VisibilityError::InvalidPredicateShape {
            missing: "string leaf key".to_string(),
        })?;

    let leaf = Leaf::new(key, LeafValue::Json(value.clone()));
    if leaf.lookup() != "range" {
        return Ok(leaf);
    }

    // Range bounds travel as integer timestamps; rebuild the instants.
    let bounds = value
        .as_array()
        .filter(|bounds| bounds.len() == 2)
        .ok_or_else(|| VisibilityError::MalformedExpression {
            reason: format!("range leaf '{}' without a 2-tuple of bounds", key),
        })?;
    let lower = timestamp_from_value(key, &bounds[0])?;
    let upper = timestamp_from_value(key, &bounds[1])?;
    debug!("Decoded range leaf '{}' as [{}, {}]", key, lower, upper);
    Ok(Leaf::new(
        key,
        LeafValue::Range(TimeRange::between(lower, upper)),
    ))
}

fn timestamp_from_value(key: &str, value: &Value) -> VisibilityResult<DateTime<Utc>> {
    let ts = value
        .as_i64()
        .ok_or_else(|| VisibilityError::MalformedExpression {
            reason: format!("range bound of '{}' is not a timestamp", key),
        })?;
    DateTime::from_timestamp(ts, 0).ok_or_else(|| VisibilityError::MalformedExpression {
        reason: format!("range bound {} of '{}' is out of range", ts, key),
    })
}
