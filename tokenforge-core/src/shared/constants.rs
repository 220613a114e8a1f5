//! Constants for the deployment pipeline
//!
//! This module contains all constants used throughout the crate.

// Network configurations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub block_explorer: &'static str,
    pub native_currency: &'static str,
    pub decimals: u32,
}

pub static BSC_TESTNET_CONFIG: NetworkConfig = NetworkConfig {
    chain_id: 97,
    name: "BSC Testnet",
    rpc_url: "https://data-seed-prebsc-1-s1.bnbchain.org:8545",
    block_explorer: "https://testnet.bscscan.com",
    native_currency: "BNB",
    decimals: 18,
};

/// The only network tokens are deployed to.
pub static REQUIRED_NETWORK: &NetworkConfig = &BSC_TESTNET_CONFIG;

// Parameter store constants
pub const PARAMETER_SESSION_KEY: &str = "tokenData";
pub const DEFAULT_DATA_DIR: &str = ".tokenforge";

// Artifact constants
pub const DEFAULT_ABI_DOCUMENT: &str = "contract1.json";
pub const DEFAULT_BYTECODE_DOCUMENT: &str = "contract2.json";
pub const DEFAULT_ARTIFACT_SOURCE: &str = "artifacts";

// Provider constants
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_CONFIRMATIONS: usize = 1;
pub const DEFAULT_EVENT_POLL_INTERVAL_MS: u64 = 2000;
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

// EIP-1193 provider error codes
pub const USER_REJECTED_CODE: i64 = 4001;
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

// Address constants
pub const ADDRESS_HEX_LENGTH: usize = 42;
