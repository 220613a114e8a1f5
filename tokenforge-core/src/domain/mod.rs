//! Domain layer - entities and repositories
//!
//! This module contains the values that flow through the deployment pipeline
//! and the traits through which it reaches persistence and artifact sources.

pub mod entities;
pub mod repositories;

// Re-export domain components
pub use entities::*;
pub use repositories::*;
