pub mod grant;
pub mod principal;

pub use grant::{FieldGrant, RowFilterRecord};
pub use principal::Principal;
