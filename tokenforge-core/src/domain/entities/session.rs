//! Wallet session entity

use crate::shared::utils::chain_id_to_hex;
use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// The connected account and the chain the wallet is currently on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    pub account: Address,
    pub chain_id: u64,
}

impl WalletSession {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self { account, chain_id }
    }

    pub fn is_on(&self, chain_id: u64) -> bool {
        self.chain_id == chain_id
    }

    pub fn chain_id_hex(&self) -> String {
        chain_id_to_hex(self.chain_id)
    }
}
