//! # FineGrain Visibility Engine
//!
//! This library implements fine-grained, per-principal read visibility over
//! structured records: which fields of a record a principal may see, and
//! which rows of a collection a principal may see.
//!
//! ## Core Components
//!
//! * `schema` - Record type metadata and the read-only schema registry
//! * `permissions` - Field grants, principals, and permission resolution
//! * `projection` - Recursive permission-narrowed schema views
//! * `filter` - Predicate trees, the expression codec, and row filtering
//! * `error` - Error types and handling
//!
//! ## Architecture
//!
//! The engine computes two orthogonal answers for a request carrying a
//! principal and a target schema. The field permission resolver and schema
//! projector produce the *shape* of the response: which fields appear, with
//! permission-governed relation fields recursively narrowed, degraded to
//! plain references, or omitted. The row filter enforcer independently
//! decides *which rows* are visible by decoding the principal's stored
//! predicate and applying it to a collection or a single object. Shape and
//! row visibility never short-circuit each other.
//!
//! Grants and row filters are administered elsewhere; the engine only reads
//! them through the `PermissionStore` seam.

pub mod error;
pub mod filter;
pub mod permissions;
pub mod projection;
pub mod schema;

// Re-export main types for convenience
pub use error::{VisibilityError, VisibilityResult};
pub use filter::{
    AnonymousFilterPolicy, Connector, ExpressionCodec, Leaf, LeafValue, Predicate, PredicateNode,
    RowFilterEnforcer, TimeRange,
};
pub use permissions::{
    FieldGrant, FieldPermissionResolver, InMemoryPermissionStore, PermissionStore, Principal,
    RowFilterRecord,
};
pub use projection::{FieldShape, ProjectedField, ProjectedView, SchemaProjector};
pub use schema::{FieldKind, Schema, SchemaField, SchemaRegistry};
