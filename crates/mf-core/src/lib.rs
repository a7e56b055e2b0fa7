//! mf-core: shared types, ids, errors and configuration.
//!
//! This crate is the foundational dependency for the other mf-* crates,
//! providing the unified error type, operation identifiers, the mixing value
//! types, and application configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use media::*;
