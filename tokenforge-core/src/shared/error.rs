//! Error handling for the deployment pipeline
//!
//! This module defines the error types used throughout the pipeline.

use crate::infrastructure::provider::ProviderError;
use thiserror::Error;

/// Deployment pipeline error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeployError {
    #[error("No wallet provider available")]
    ProviderUnavailable,

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("User rejected the connection request")]
    UserRejected,

    #[error("User rejected the network switch to {0}")]
    SwitchRejected(String),

    #[error("Network switch failed: {0}")]
    SwitchFailed(String),

    #[error("Failed to load contract artifact: {0}")]
    ArtifactLoadFailed(String),

    #[error("Fee estimation failed: {0}")]
    EstimationFailed(String),

    #[error("Deployment failed: {0}")]
    DeploymentFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No token parameters found")]
    MissingParameters,

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("A deployment is already in flight")]
    DeploymentInFlight,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl DeployError {
    /// Create a network switch failure
    pub fn switch_failed(message: impl Into<String>) -> Self {
        Self::SwitchFailed(message.into())
    }

    /// Create an artifact loading error
    pub fn artifact(message: impl Into<String>) -> Self {
        Self::ArtifactLoadFailed(message.into())
    }

    /// Create a fee estimation error
    pub fn estimation(message: impl Into<String>) -> Self {
        Self::EstimationFailed(message.into())
    }

    /// Create a deployment error
    pub fn deployment(message: impl Into<String>) -> Self {
        Self::DeploymentFailed(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The bare reason without the variant prefix, for wrapping into another
    /// stage's error
    pub fn detail(&self) -> String {
        match self {
            Self::SwitchRejected(msg)
            | Self::SwitchFailed(msg)
            | Self::ArtifactLoadFailed(msg)
            | Self::EstimationFailed(msg)
            | Self::DeploymentFailed(msg)
            | Self::Validation(msg)
            | Self::Storage(msg)
            | Self::Config(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the failure happened while establishing the wallet session.
    /// The deploy flow sends the user back to the entry step for these.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable | Self::NoAccounts | Self::UserRejected | Self::NotConnected
        )
    }
}

// Standard library error conversions
impl From<std::io::Error> for DeployError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("JSON error: {}", err))
    }
}

impl From<hex::FromHexError> for DeployError {
    fn from(err: hex::FromHexError) -> Self {
        Self::validation(format!("Hex decoding error: {}", err))
    }
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        Self::artifact(format!("HTTP error: {}", err))
    }
}

impl From<ethers::abi::Error> for DeployError {
    fn from(err: ethers::abi::Error) -> Self {
        Self::estimation(format!("ABI encoding error: {}", err))
    }
}
