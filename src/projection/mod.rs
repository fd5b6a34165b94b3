// projection module

pub mod projector;
pub mod view;

pub use projector::SchemaProjector;
pub use view::{FieldShape, ProjectedField, ProjectedView};
