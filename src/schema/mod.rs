pub mod registry;
pub mod types;

pub use registry::SchemaRegistry;

// Re-export core types at the schema module level
pub use types::{FieldKind, Schema, SchemaField};
