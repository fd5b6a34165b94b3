pub mod fields;
pub mod schema;

pub use fields::{FieldKind, SchemaField};
pub use schema::Schema;
