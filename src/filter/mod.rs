// row filter module

pub mod codec;
pub mod enforcer;
pub mod matcher;
pub mod predicate;

pub use codec::ExpressionCodec;
pub use enforcer::{AnonymousFilterPolicy, RowFilterEnforcer};
pub use predicate::{Connector, Leaf, LeafValue, Predicate, PredicateNode, TimeRange};
