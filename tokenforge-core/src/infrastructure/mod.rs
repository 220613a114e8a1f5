//! Infrastructure layer - external integrations
//!
//! Wallet provider, parameter persistence, artifact retrieval, configuration
//! and the user-facing output sinks.

pub mod provider;
pub mod storage;
pub mod artifacts;
pub mod config;
pub mod status;

// Re-export infrastructure components
pub use provider::{
    DeploymentReceipt, DeploymentRequest, EventWatcher, ProviderError, ProviderEvent, RpcWalletProvider, WalletProvider,
};
pub use storage::*;
pub use artifacts::*;
pub use config::*;
pub use status::*;
