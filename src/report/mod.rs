//! Reporting utilities: formatted output shared by every front-end.

pub mod format;

pub use format::*;
