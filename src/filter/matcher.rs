//! In-memory predicate evaluation against JSON records.
//!
//! This is the bundled collection-query collaborator: it supports the same
//! lookup vocabulary the codec round-trips, with `__`-separated field paths
//! traversing nested objects. A missing path or a type mismatch is a
//! non-match, never an error; only structurally unusable filters (an invalid
//! regex, an unknown lookup) surface errors.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::error::{VisibilityError, VisibilityResult};
use crate::filter::codec::{max_instant, min_instant};
use crate::filter::predicate::{Connector, Leaf, LeafValue, Predicate, PredicateNode, TimeRange};

/// Evaluates a predicate tree against a single record.
pub fn matches(record: &Value, predicate: &Predicate) -> VisibilityResult<bool> {
    let mut verdict = true;
    if !predicate.children.is_empty() {
        match predicate.connector {
            Connector::And => {
                for child in &predicate.children {
                    if !matches_node(record, child)? {
                        verdict = false;
                        break;
                    }
                }
            }
            Connector::Or => {
                verdict = false;
                for child in &predicate.children {
                    if matches_node(record, child)? {
                        verdict = true;
                        break;
                    }
                }
            }
        }
    }
    Ok(verdict != predicate.negated)
}

fn matches_node(record: &Value, node: &PredicateNode) -> VisibilityResult<bool> {
    match node {
        PredicateNode::Group(group) => matches(record, group),
        PredicateNode::Leaf(leaf) => matches_leaf(record, leaf),
    }
}

fn matches_leaf(record: &Value, leaf: &Leaf) -> VisibilityResult<bool> {
    let Some(actual) = resolve_path(record, leaf.path()) else {
        return Ok(false);
    };

    match &leaf.value {
        LeafValue::Range(range) => Ok(matches_range(actual, range)),
        LeafValue::Json(expected) => match leaf.lookup() {
            "exact" => Ok(loose_eq(actual, expected)),
            "iexact" => Ok(str_pair(actual, expected)
                .map_or(false, |(a, b)| a.eq_ignore_ascii_case(b))),
            "contains" => Ok(str_pair(actual, expected).map_or(false, |(a, b)| a.contains(b))),
            "icontains" => Ok(str_pair(actual, expected)
                .map_or(false, |(a, b)| a.to_lowercase().contains(&b.to_lowercase()))),
            "startswith" => {
                Ok(str_pair(actual, expected).map_or(false, |(a, b)| a.starts_with(b)))
            }
            "istartswith" => Ok(str_pair(actual, expected)
                .map_or(false, |(a, b)| a.to_lowercase().starts_with(&b.to_lowercase()))),
            "endswith" => Ok(str_pair(actual, expected).map_or(false, |(a, b)| a.ends_with(b))),
            "iendswith" => Ok(str_pair(actual, expected)
                .map_or(false, |(a, b)| a.to_lowercase().ends_with(&b.to_lowercase()))),
            "in" => Ok(expected
                .as_array()
                .map_or(false, |options| options.iter().any(|v| loose_eq(actual, v)))),
            "gt" => Ok(compare(actual, expected) == Some(Ordering::Greater)),
            "gte" => Ok(matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            "lt" => Ok(compare(actual, expected) == Some(Ordering::Less)),
            "lte" => Ok(matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            )),
            "range" => Ok(matches_json_range(actual, expected)),
            "isnull" => Ok(actual.is_null() == expected.as_bool().unwrap_or(false)),
            "regex" | "iregex" => {
                let (Some(text), Some(pattern)) = (actual.as_str(), expected.as_str()) else {
                    return Ok(false);
                };
                let pattern = if leaf.lookup() == "iregex" {
                    format!("(?i){}", pattern)
                } else {
                    pattern.to_string()
                };
                let re = Regex::new(&pattern).map_err(|e| VisibilityError::MalformedExpression {
                    reason: format!("invalid regex in filter: {}", e),
                })?;
                Ok(re.is_match(text))
            }
            other => Err(VisibilityError::MalformedExpression {
                reason: format!("unsupported lookup '{}'", other),
            }),
        },
    }
}

/// Walks a `__`-separated path into nested objects. `None` when any segment
/// is absent or the intermediate value is not an object.
fn resolve_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split("__") {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Inclusive temporal range check, mirroring a BETWEEN comparison.
fn matches_range(actual: &Value, range: &TimeRange) -> bool {
    let Some(instant) = value_to_instant(actual) else {
        return false;
    };
    range.lower.map_or(true, |lower| instant >= lower)
        && range.upper.map_or(true, |upper| instant <= upper)
}

/// Range lookup with native JSON bounds, for hand-built predicates that
/// never went through the codec. Temporal bounds are preferred; a pair of
/// plain numbers falls back to a numeric between.
fn matches_json_range(actual: &Value, expected: &Value) -> bool {
    let Some(bounds) = expected.as_array().filter(|bounds| bounds.len() == 2) else {
        return false;
    };

    let lower_instant = instant_bound(&bounds[0], min_instant());
    let upper_instant = instant_bound(&bounds[1], max_instant());
    if let (Some(lower), Some(upper)) = (lower_instant, upper_instant) {
        if let Some(instant) = value_to_instant(actual) {
            return instant >= lower && instant <= upper;
        }
    }

    match (actual.as_f64(), bounds[0].as_f64(), bounds[1].as_f64()) {
        (Some(v), Some(lower), Some(upper)) => v >= lower && v <= upper,
        _ => false,
    }
}

fn instant_bound(bound: &Value, open: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if bound.is_null() {
        return Some(open);
    }
    value_to_instant(bound)
}

/// Equality with numeric coercion: integers and floats representing the
/// same quantity compare equal, everything else uses structural equality.
fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

fn str_pair<'a>(a: &'a Value, b: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((a.as_str()?, b.as_str()?))
}

/// Ordering with numeric, temporal, then lexicographic preference.
fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        if actual.is_number() && expected.is_number() {
            return a.partial_cmp(&b);
        }
    }
    let (a, b) = str_pair(actual, expected)?;
    match (parse_instant(a), parse_instant(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => Some(a.cmp(b)),
    }
}

/// Interprets a JSON value as a UTC instant: integer timestamps and the
/// common textual date/datetime forms.
fn value_to_instant(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => DateTime::from_timestamp(n.as_i64()?, 0),
        Value::String(s) => parse_instant(s),
        _ => None,
    }
}

fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "id": 3,
            "username": "arthur",
            "email": "arthur@example.org",
            "score": 42.0,
            "deleted": null,
            "joined": "2005-02-15 12:30:00",
            "profile": {"city": "Brest", "zip": "29200"}
        })
    }

    fn leaf(key: &str, value: Value) -> Predicate {
        Predicate::all_of(vec![PredicateNode::leaf(key, value)])
    }

    #[test]
    fn test_exact_and_implicit_exact() {
        assert!(matches(&record(), &leaf("username__exact", json!("arthur"))).unwrap());
        assert!(matches(&record(), &leaf("username", json!("arthur"))).unwrap());
        assert!(!matches(&record(), &leaf("username", json!("jean"))).unwrap());
    }

    #[test]
    fn test_numeric_coercion_on_exact() {
        assert!(matches(&record(), &leaf("id", json!(3.0))).unwrap());
        assert!(matches(&record(), &leaf("score", json!(42))).unwrap());
    }

    #[test]
    fn test_case_insensitive_lookups() {
        assert!(matches(&record(), &leaf("username__iexact", json!("ARTHUR"))).unwrap());
        assert!(matches(&record(), &leaf("username__icontains", json!("RTH"))).unwrap());
        assert!(matches(&record(), &leaf("username__istartswith", json!("Ar"))).unwrap());
        assert!(matches(&record(), &leaf("username__iendswith", json!("UR"))).unwrap());
    }

    #[test]
    fn test_string_lookups() {
        assert!(matches(&record(), &leaf("username__contains", json!("thu"))).unwrap());
        assert!(!matches(&record(), &leaf("username__contains", json!("THU"))).unwrap());
        assert!(matches(&record(), &leaf("username__startswith", json!("ar"))).unwrap());
        assert!(matches(&record(), &leaf("email__endswith", json!(".org"))).unwrap());
    }

    #[test]
    fn test_in_lookup() {
        assert!(matches(&record(), &leaf("username__in", json!(["jean", "arthur"]))).unwrap());
        assert!(!matches(&record(), &leaf("username__in", json!(["jean", "jojo"]))).unwrap());
    }

    #[test]
    fn test_ordering_lookups() {
        assert!(matches(&record(), &leaf("id__gt", json!(2))).unwrap());
        assert!(matches(&record(), &leaf("id__gte", json!(3))).unwrap());
        assert!(!matches(&record(), &leaf("id__lt", json!(3))).unwrap());
        assert!(matches(&record(), &leaf("id__lte", json!(3))).unwrap());
        assert!(matches(&record(), &leaf("username__gt", json!("aaa"))).unwrap());
    }

    #[test]
    fn test_temporal_range() {
        let range = Predicate::all_of(vec![PredicateNode::range(
            "joined__range",
            TimeRange::between(
                Utc.with_ymd_and_hms(2005, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2005, 3, 31, 0, 0, 0).unwrap(),
            ),
        )]);
        assert!(matches(&record(), &range).unwrap());

        let outside = Predicate::all_of(vec![PredicateNode::range(
            "joined__range",
            TimeRange::between(
                Utc.with_ymd_and_hms(2006, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2006, 3, 31, 0, 0, 0).unwrap(),
            ),
        )]);
        assert!(!matches(&record(), &outside).unwrap());
    }

    #[test]
    fn test_open_bound_range() {
        let open_upper = Predicate::all_of(vec![PredicateNode::range(
            "joined__range",
            TimeRange::new(Some(Utc.with_ymd_and_hms(2005, 1, 1, 0, 0, 0).unwrap()), None),
        )]);
        assert!(matches(&record(), &open_upper).unwrap());
    }

    #[test]
    fn test_json_range_bounds() {
        let temporal = leaf("joined__range", json!(["2005-01-01", "2005-03-31"]));
        assert!(matches(&record(), &temporal).unwrap());

        let numeric = leaf("id__range", json!([1, 5]));
        assert!(matches(&record(), &numeric).unwrap());
        let numeric_miss = leaf("id__range", json!([10, 20]));
        assert!(!matches(&record(), &numeric_miss).unwrap());
    }

    #[test]
    fn test_isnull_lookup() {
        assert!(matches(&record(), &leaf("deleted__isnull", json!(true))).unwrap());
        assert!(!matches(&record(), &leaf("username__isnull", json!(true))).unwrap());
        assert!(matches(&record(), &leaf("username__isnull", json!(false))).unwrap());
    }

    #[test]
    fn test_regex_lookups() {
        assert!(matches(&record(), &leaf("username__regex", json!("^art.*r$"))).unwrap());
        assert!(matches(&record(), &leaf("username__iregex", json!("^ART"))).unwrap());
        assert!(!matches(&record(), &leaf("username__regex", json!("^ART"))).unwrap());
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let err = matches(&record(), &leaf("username__regex", json!("(unclosed"))).unwrap_err();
        assert!(matches!(err, VisibilityError::MalformedExpression { .. }));
    }

    #[test]
    fn test_nested_path_traversal() {
        assert!(matches(&record(), &leaf("profile__city__exact", json!("Brest"))).unwrap());
        assert!(matches(&record(), &leaf("profile__zip__startswith", json!("29"))).unwrap());
    }

    #[test]
    fn test_missing_path_is_a_non_match() {
        assert!(!matches(&record(), &leaf("unknown__exact", json!(1))).unwrap());
        assert!(!matches(&record(), &leaf("profile__unknown", json!(1))).unwrap());
        assert!(!matches(&record(), &leaf("username__city", json!(1))).unwrap());
    }

    #[test]
    fn test_empty_group_matches_everything() {
        assert!(matches(&record(), &Predicate::unrestricted()).unwrap());
        assert!(!matches(&record(), &Predicate::unrestricted().negate()).unwrap());
    }

    #[test]
    fn test_connectors_and_negation() {
        let both = Predicate::all_of(vec![
            PredicateNode::leaf("username", json!("arthur")),
            PredicateNode::leaf("id", json!(3)),
        ]);
        assert!(matches(&record(), &both).unwrap());

        let either = Predicate::any_of(vec![
            PredicateNode::leaf("username", json!("jean")),
            PredicateNode::leaf("id", json!(3)),
        ]);
        assert!(matches(&record(), &either).unwrap());

        let neither = Predicate::any_of(vec![
            PredicateNode::leaf("username", json!("jean")),
            PredicateNode::leaf("id", json!(4)),
        ]);
        assert!(!matches(&record(), &neither).unwrap());
        assert!(matches(&record(), &neither.negate()).unwrap());
    }

    #[test]
    fn test_nested_groups() {
        let tree = Predicate::any_of(vec![
            PredicateNode::leaf("username__contains", json!("zzz")),
            PredicateNode::Group(Predicate::all_of(vec![
                PredicateNode::leaf("profile__city", json!("Brest")),
                PredicateNode::Group(Predicate::any_of(vec![
                    PredicateNode::leaf("id", json!(99)),
                    PredicateNode::leaf("score__gte", json!(40)),
                ])),
            ])),
        ]);
        assert!(matches(&record(), &tree).unwrap());
    }
}
