//! # Visibility Engine Error Handling
//!
//! Unified error handling for the visibility engine, providing structured
//! error information that preserves context while enabling better debugging.
//!
//! This error system is designed to:
//! - Provide specific error variants for each failure class (codec,
//!   projection, lookup)
//! - Keep configuration-time errors (recursive relation conflicts, missing
//!   record attributes) distinguishable from corrupt-data errors
//! - Support equality comparison so callers and tests can match on exact
//!   failures

use thiserror::Error;

/// Unified error type for visibility engine operations.
///
/// Codec errors (`NotAPredicate`, `MalformedExpression`,
/// `InvalidPredicateShape`) indicate corrupt or incompatible stored data and
/// must never be retried. `RecursiveRelationConflict` and `MissingAttribute`
/// are configuration errors meant to surface during development and testing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisibilityError {
    // ========== Expression Codec Errors ==========
    /// The value handed to the encoder is not a well-formed predicate tree
    #[error("Not a predicate: {reason}")]
    NotAPredicate { reason: String },

    /// The stored expression text is not valid structured data
    #[error("Malformed expression: {reason}")]
    MalformedExpression { reason: String },

    /// Decoded expression data lacks a required key or uses a wrong shape
    #[error("Invalid predicate shape: missing {missing}")]
    InvalidPredicateShape { missing: String },

    // ========== Projection Errors ==========
    /// Two permission-governed relation fields expand into each other
    #[error("Recursive relation conflict: {field_a} and {field_b} expand into each other")]
    RecursiveRelationConflict { field_a: String, field_b: String },

    /// A record is missing an attribute named by a projected view
    #[error("Missing attribute: field {field_name} in schema {schema_name}")]
    MissingAttribute {
        schema_name: String,
        field_name: String,
    },

    // ========== Lookup Errors ==========
    /// A schema or permission record lookup found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input data (schema definitions, grant dumps, records) is unusable
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for visibility engine operations.
pub type VisibilityResult<T> = Result<T, VisibilityError>;
