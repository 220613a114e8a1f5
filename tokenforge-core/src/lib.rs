//! TokenForge Core
//!
//! Deploys a user-defined token contract through a connected wallet.
//!
//! ## Architecture
//!
//! - **Application**: the deployment flow controller and its state machine
//! - **Core**: wallet connection, network switching, fee estimation,
//!   deployment and artifact loading
//! - **Domain**: entities and repository traits
//! - **Infrastructure**: JSON-RPC wallet provider, parameter stores, artifact
//!   sources, configuration and status output
//! - **Shared**: common types, constants, errors and utilities
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokenforge_core::{
//!     build_controller, AutoConfirm, ConsoleStatusSink, DeployerConfig, FlowOutcome, RpcWalletProvider,
//!     WalletProvider,
//! };
//!
//! # async fn deploy() -> Result<(), tokenforge_core::DeployError> {
//! tokenforge_core::init();
//! let config = DeployerConfig::from_env()?;
//! let provider: Arc<dyn WalletProvider> = Arc::new(RpcWalletProvider::connect(&config.rpc_url)?);
//! let mut controller = build_controller(&config, Some(provider), Arc::new(ConsoleStatusSink));
//!
//! if let FlowOutcome::Deployed(result) = controller.run(&AutoConfirm).await {
//!     println!("Token deployed at {}", result.address_string());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod application;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export the flow controller
pub use application::{
    AutoConfirm, DeployConfirmation, DeploymentController, FlowOutcome, FlowSignal, Halt, PipelineState, StageResult,
};

// Re-export pipeline stages
pub use crate::core::{
    ArtifactLoader, DeploymentExecutor, FeeEstimator, NetworkCheck, NetworkGuarantor, SessionSubscription,
    WalletConnector,
};

// Re-export domain entities and repositories
pub use domain::{
    ArtifactSource, ContractArtifact, DeploymentResult, FeeQuote, ParameterStore, TokenParameters, WalletSession,
};

// Re-export infrastructure components
pub use infrastructure::{
    source_for, ConsoleStatusSink, DeployerConfig, DirectoryArtifactSource, EventWatcher, FileParameterStore,
    HttpArtifactSource, MemoryParameterStore, ProviderError, ProviderEvent, RecordingStatusSink, RpcWalletProvider,
    StatusSink, WalletProvider,
};

// Re-export shared types
pub use shared::constants::{NetworkConfig, REQUIRED_NETWORK};
pub use shared::error::DeployError;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize logging. Honours `RUST_LOG`, defaults to `info`, and is safe to
/// call more than once.
pub fn init() {
    let initialized = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
    if initialized.is_ok() {
        log::debug!("{} {} initialized", NAME, VERSION);
    }
}

/// Wire a controller from configuration: file parameter store under the data
/// directory and the configured artifact source
pub fn build_controller(
    config: &DeployerConfig,
    provider: Option<Arc<dyn WalletProvider>>,
    sink: Arc<dyn StatusSink>,
) -> DeploymentController {
    let store = Arc::new(FileParameterStore::new(config.data_dir.clone()));
    let loader = ArtifactLoader::with_documents(
        source_for(&config.artifact_source),
        config.abi_document.clone(),
        config.bytecode_document.clone(),
    );
    DeploymentController::new(WalletConnector::new(provider), store, loader, sink)
}
