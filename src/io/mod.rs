//! Input/output helpers.
//!
//! - configuration tree read/write and path resolution (`config`)

pub mod config;

pub use config::*;
