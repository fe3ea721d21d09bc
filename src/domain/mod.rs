//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - per-source landing records (`HarvestRecord`, `EnrichmentRecord`) and their metadata
//! - canonical outputs (`CanonicalBook`, `SourceDetailRecord`, `QualityMetrics`)
//! - stage configuration (`HarvestConfig`, `EnrichConfig`, `Layout`)

pub mod config;
pub mod lenient;
pub mod types;

pub use config::*;
pub use types::*;
