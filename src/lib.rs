//! `formcast` library crate.
//!
//! The binary (`formcast`) is a thin wrapper around this library so that:
//!
//! - schemas, validation and record assembly are testable without a terminal
//! - the TUI, line prompt and one-shot CLI share one prediction pipeline
//! - models stay behind a trait and can be swapped in tests

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod models;
pub mod predict;
pub mod record;
pub mod report;
pub mod schema;
pub mod tui;
