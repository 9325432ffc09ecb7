//! Field schemas and input validation.
//!
//! - literal option catalogs per variant (`catalog`)
//! - the registry that turns an option source into a `Schema` (`registry`)
//! - raw input validation (`validate`)

pub mod catalog;
pub mod registry;
pub mod validate;

pub use registry::*;
pub use validate::*;
