//! Wallet provider abstraction
//!
//! The pipeline talks to the wallet exclusively through [`WalletProvider`],
//! an EIP-1193 style surface: account authorization, chain inspection and
//! switching, gas queries, transaction submission, and a broadcast stream of
//! account/chain change events.

pub mod rpc;
pub mod watcher;

pub use rpc::RpcWalletProvider;
pub use watcher::EventWatcher;

use crate::shared::constants::{UNRECOGNIZED_CHAIN_CODE, USER_REJECTED_CODE};
use crate::shared::types::{Address, Bytes, ChainId, GasUnits, TransactionHash, Wei};
use async_trait::async_trait;
use ethers::providers::RpcError;
use thiserror::Error;
use tokio::sync::broadcast;

/// Failure reported by the wallet provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("User rejected the request")]
    UserRejected,

    #[error("Unrecognized chain: {0}")]
    UnrecognizedChain(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    /// Classify a JSON-RPC error response by its EIP-1193 code
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain(message),
            _ => Self::Rpc { code, message },
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::UserRejected)
    }
}

impl From<ethers::providers::ProviderError> for ProviderError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        match err.as_error_response() {
            Some(response) => Self::from_rpc(response.code, response.message.clone()),
            None => Self::Transport(err.to_string()),
        }
    }
}

/// Events a wallet emits on its own initiative
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
}

impl ProviderEvent {
    /// Whether the event makes any in-flight pipeline step meaningless for a
    /// session on `current_chain`. Losing every account or moving to another
    /// chain does. Switching to a different account only refreshes the
    /// session, and a `chainChanged` for the chain already in use is the echo
    /// of our own switch.
    pub fn invalidates_flow(&self, current_chain: Option<ChainId>) -> bool {
        match self {
            Self::AccountsChanged(accounts) => accounts.is_empty(),
            Self::ChainChanged(chain_id) => current_chain != Some(*chain_id),
        }
    }
}

/// A fully priced contract creation transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub from: Address,
    pub data: Bytes,
    pub gas: GasUnits,
    pub gas_price: Wei,
}

/// Receipt of an included transaction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeploymentReceipt {
    pub transaction_hash: TransactionHash,
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    pub gas_used: Option<GasUnits>,
    /// 1 for success, 0 for revert, absent on pre-Byzantium chains
    pub status: Option<u64>,
}

/// Wallet provider trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user to authorize account access
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Chain the wallet is currently on
    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Ask the user to move the wallet to another chain (`0x`-prefixed id).
    /// Resolves only once the user has answered the prompt.
    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError>;

    async fn gas_price(&self) -> Result<Wei, ProviderError>;

    async fn estimate_gas(&self, call_data: &Bytes, from: Address) -> Result<GasUnits, ProviderError>;

    /// Submit the transaction and wait until it is included
    async fn send_transaction(&self, request: DeploymentRequest) -> Result<DeploymentReceipt, ProviderError>;

    /// Subscribe to account and chain change events
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
