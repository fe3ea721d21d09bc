//! Input/output helpers.
//!
//! - landing artifacts: harvest JSON, enrichment CSV + sidecar (`landing`)
//! - standard Parquet tables (`export`)
//! - schema and quality documents (`docs`)

pub mod docs;
pub mod export;
pub mod landing;

pub use docs::*;
pub use export::*;
pub use landing::*;
