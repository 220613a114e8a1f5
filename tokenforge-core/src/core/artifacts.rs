//! Artifact loading
//!
//! Fetches the interface and bytecode documents concurrently and combines
//! them into a `ContractArtifact`.

use crate::domain::entities::ContractArtifact;
use crate::domain::repositories::ArtifactSource;
use crate::shared::constants::{DEFAULT_ABI_DOCUMENT, DEFAULT_BYTECODE_DOCUMENT};
use crate::shared::error::DeployError;

pub struct ArtifactLoader {
    source: Box<dyn ArtifactSource>,
    abi_document: String,
    bytecode_document: String,
}

impl ArtifactLoader {
    /// Loader for the default document names
    pub fn new(source: Box<dyn ArtifactSource>) -> Self {
        Self::with_documents(source, DEFAULT_ABI_DOCUMENT, DEFAULT_BYTECODE_DOCUMENT)
    }

    pub fn with_documents(
        source: Box<dyn ArtifactSource>,
        abi_document: impl Into<String>,
        bytecode_document: impl Into<String>,
    ) -> Self {
        Self {
            source,
            abi_document: abi_document.into(),
            bytecode_document: bytecode_document.into(),
        }
    }

    /// Fetch both documents. Either failing fails the whole load.
    pub async fn load(&self) -> Result<ContractArtifact, DeployError> {
        log::info!(
            "Loading contract artifact from {} ({}, {})",
            self.source.location(),
            self.abi_document,
            self.bytecode_document
        );
        let (interface, bytecode) = tokio::try_join!(
            self.source.fetch(&self.abi_document),
            self.source.fetch(&self.bytecode_document)
        )
        .map_err(|e| {
            log::error!("Failed to load artifact: {}", e);
            DeployError::artifact(e.detail())
        })?;

        let artifact = ContractArtifact::from_documents(interface, bytecode)?;
        log::info!("Loaded contract artifact, bytecode {} bytes", artifact.bytecode.len());
        Ok(artifact)
    }
}
