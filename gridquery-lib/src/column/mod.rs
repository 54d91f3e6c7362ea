//! Column model: declarative definitions, filter descriptors, and the
//! normalizer that turns them into the table's initial state.

mod filter;
mod normalize;
mod spec;

pub use filter::*;
pub(crate) use normalize::*;
pub use spec::*;
