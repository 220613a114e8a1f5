//! Application layer - the deployment flow
//!
//! Orchestrates the core stages over the domain and infrastructure layers.

pub mod pipeline;

pub use pipeline::*;
