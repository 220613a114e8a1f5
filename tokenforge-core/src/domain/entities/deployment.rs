//! Deployment result entity

use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};

/// Outcome of a successful deployment transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub contract_address: Address,
    pub transaction_hash: Option<H256>,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentResult {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            transaction_hash: None,
            block_number: None,
            gas_used: None,
            deployed_at: Utc::now(),
        }
    }

    /// EIP-55 checksummed address
    pub fn address_string(&self) -> String {
        to_checksum(&self.contract_address, None)
    }

    pub fn explorer_url(&self, block_explorer: &str) -> String {
        format!("{}/address/{}", block_explorer.trim_end_matches('/'), self.address_string())
    }
}
