//! Core pipeline stages
//!
//! Each stage wraps one interaction with the wallet or the artifact source:
//! connecting, network verification, fee estimation, deployment and
//! artifact loading.

pub mod wallet;
pub mod network;
pub mod fees;
pub mod deployment;
pub mod artifacts;

pub use wallet::{SessionSubscription, WalletConnector};
pub use network::{NetworkCheck, NetworkGuarantor};
pub use fees::{FeeEstimator, PricedDeployment};
pub use deployment::DeploymentExecutor;
pub use artifacts::ArtifactLoader;
