//! Normalization helpers shared by the enricher and the integrator.
//!
//! - field cleanup and format normalization (`fields`)
//! - ISBN handling (`isbn`)
//! - canonical ids and linkage keys (`identity`)

pub mod fields;
pub mod identity;
pub mod isbn;

pub use fields::*;
pub use identity::*;
pub use isbn::*;
