//! `book-etl` library crate.
//!
//! The binaries (`harvest`, `enrich`, `integrate`) are thin wrappers around
//! this library so that:
//!
//! - each stage is testable without spawning processes or touching the network
//! - the stages share one set of domain types, normalizers and writers

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod integrate;
pub mod io;
pub mod logging;
pub mod normalize;
pub mod report;
