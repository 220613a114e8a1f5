//! Domain repositories
//!
//! Traits for the external collaborators the pipeline reads from and
//! writes to.

pub mod parameter_store;
pub mod artifact_source;

// Re-export repositories
pub use parameter_store::*;
pub use artifact_source::*;
