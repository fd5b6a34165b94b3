//! Boolean predicate trees for row-level filters.
//!
//! A predicate is a pure value: a group node carries a connector, a negation
//! flag and child nodes; a leaf carries a `"<field-path>__<lookup>"` key and
//! a comparison value. Trees compare structurally and are freely clonable;
//! nothing here holds identity or external resources.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Lookup names recognized at the end of a leaf key. A trailing key segment
/// that is not one of these is part of the field path, and the lookup is the
/// implicit `exact`.
pub const LOOKUP_NAMES: &[&str] = &[
    "exact",
    "iexact",
    "contains",
    "icontains",
    "startswith",
    "istartswith",
    "endswith",
    "iendswith",
    "in",
    "gt",
    "gte",
    "lt",
    "lte",
    "range",
    "isnull",
    "regex",
    "iregex",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// A temporal range with optionally open bounds, ordered (lower, upper).
/// Open bounds are replaced by sentinel instants when the owning leaf is
/// canonicalized for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub lower: Option<DateTime<Utc>>,
    pub upper: Option<DateTime<Utc>>,
}

impl TimeRange {
    #[must_use]
    pub fn new(lower: Option<DateTime<Utc>>, upper: Option<DateTime<Utc>>) -> Self {
        Self { lower, upper }
    }

    #[must_use]
    pub fn between(lower: DateTime<Utc>, upper: DateTime<Utc>) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }
}

/// A leaf comparison value: either a native JSON value (strings, numbers,
/// booleans, arrays for `in` lookups) or a temporal range for `range`
/// lookups.
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Json(Value),
    Range(TimeRange),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub key: String,
    pub value: LeafValue,
}

impl Leaf {
    #[must_use]
    pub fn new(key: impl Into<String>, value: LeafValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// The lookup named by the key's trailing `__` segment, or `exact` when
    /// the trailing segment is not a recognized lookup name.
    #[must_use]
    pub fn lookup(&self) -> &str {
        match self.key.rsplit_once("__") {
            Some((_, last)) if LOOKUP_NAMES.contains(&last) => last,
            _ => "exact",
        }
    }

    /// The field path portion of the key, with any lookup suffix removed.
    /// Remaining `__` separators denote traversal into nested records.
    #[must_use]
    pub fn path(&self) -> &str {
        match self.key.rsplit_once("__") {
            Some((head, last)) if LOOKUP_NAMES.contains(&last) => head,
            _ => &self.key,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    Group(Predicate),
    Leaf(Leaf),
}

impl PredicateNode {
    #[must_use]
    pub fn leaf(key: impl Into<String>, value: Value) -> Self {
        PredicateNode::Leaf(Leaf::new(key, LeafValue::Json(value)))
    }

    #[must_use]
    pub fn range(key: impl Into<String>, range: TimeRange) -> Self {
        PredicateNode::Leaf(Leaf::new(key, LeafValue::Range(range)))
    }
}

/// A group node. The empty group matches everything, mirroring the behavior
/// of an empty query object in the stores this engine fronts.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub connector: Connector,
    pub negated: bool,
    pub children: Vec<PredicateNode>,
}

impl Predicate {
    #[must_use]
    pub fn all_of(children: Vec<PredicateNode>) -> Self {
        Self {
            connector: Connector::And,
            negated: false,
            children,
        }
    }

    #[must_use]
    pub fn any_of(children: Vec<PredicateNode>) -> Self {
        Self {
            connector: Connector::Or,
            negated: false,
            children,
        }
    }

    /// The match-everything predicate.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::all_of(Vec::new())
    }

    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn push(&mut self, node: PredicateNode) {
        self.children.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_and_path_split() {
        let leaf = Leaf::new("username__exact", LeafValue::Json(json!("arthur")));
        assert_eq!(leaf.lookup(), "exact");
        assert_eq!(leaf.path(), "username");
    }

    #[test]
    fn test_implicit_exact_lookup() {
        let leaf = Leaf::new("field3", LeafValue::Json(json!("test3")));
        assert_eq!(leaf.lookup(), "exact");
        assert_eq!(leaf.path(), "field3");
    }

    #[test]
    fn test_relation_path_keeps_traversal_segments() {
        let leaf = Leaf::new("rel1__field2__exact", LeafValue::Json(json!("test2")));
        assert_eq!(leaf.lookup(), "exact");
        assert_eq!(leaf.path(), "rel1__field2");
    }

    #[test]
    fn test_unknown_trailing_segment_is_path() {
        let leaf = Leaf::new("account__owner", LeafValue::Json(json!(1)));
        assert_eq!(leaf.lookup(), "exact");
        assert_eq!(leaf.path(), "account__owner");
    }

    #[test]
    fn test_structural_equality() {
        let a = Predicate::any_of(vec![
            PredicateNode::leaf("username", json!("arthur")),
            PredicateNode::leaf("username", json!("jean")),
        ]);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, b.clone().negate());
    }
}
