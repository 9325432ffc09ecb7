//! Feature record assembly.
//!
//! `derived` holds the recipes for computed columns; `builder` turns validated
//! inputs plus an explicit `now` into the single-row `FeatureRecord`.

pub mod builder;
pub mod derived;

pub use builder::*;
pub use derived::*;
