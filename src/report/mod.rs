//! Human-facing stage summaries printed to stdout.

pub mod format;

pub use format::*;
