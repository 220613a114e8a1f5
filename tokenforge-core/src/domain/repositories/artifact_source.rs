//! Artifact source repository
//!
//! Where the interface and bytecode documents are fetched from.

use crate::shared::error::DeployError;
use async_trait::async_trait;
use serde_json::Value;

/// A place static JSON documents can be retrieved from by name
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Fetch and parse one document
    async fn fetch(&self, name: &str) -> Result<Value, DeployError>;

    /// Human-readable location, used in logs and error messages
    fn location(&self) -> String;
}
