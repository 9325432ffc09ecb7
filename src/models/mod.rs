//! Model handles.
//!
//! `model` defines the boundary trait and artifact loading; `artifact` holds the
//! JSON pipeline formats the shipped models use.

pub mod artifact;
pub mod model;

pub use model::*;
