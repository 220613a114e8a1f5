//! Basic type aliases shared by the pipeline stages

pub use ethers::types::{Address, Bytes, H256, U256};

pub type ChainId = u64;
pub type Wei = U256;
pub type GasUnits = U256;
pub type TransactionHash = H256;
