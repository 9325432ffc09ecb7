//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - application variants (`AppVariant`) and their display conventions
//! - input field declarations (`FieldSpec`, `FieldKind`) and values (`FieldValue`)
//! - model outputs (`Prediction`, `DisplayFormat`)

pub mod types;

pub use types::*;
