//! Network guarantor
//!
//! Makes sure the wallet is on the required chain before anything is priced
//! or submitted.

use crate::infrastructure::provider::WalletProvider;
use crate::shared::error::DeployError;
use crate::shared::utils::chain_id_to_hex;
use std::sync::Arc;

/// What `ensure_network` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkCheck {
    AlreadyOnTarget,
    Switched { from: u64 },
}

pub struct NetworkGuarantor {
    provider: Arc<dyn WalletProvider>,
}

impl NetworkGuarantor {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    /// Switch the wallet to `required_chain_id` unless it is already there.
    ///
    /// The switch prompt is awaited without a timeout and never retried; a
    /// rejected prompt surfaces as `SwitchRejected`.
    pub async fn ensure_network(&self, required_chain_id: u64) -> Result<NetworkCheck, DeployError> {
        let required_hex = chain_id_to_hex(required_chain_id);
        let current = self
            .provider
            .chain_id()
            .await
            .map_err(|e| DeployError::switch_failed(format!("Failed to read current chain: {}", e)))?;

        if current == required_chain_id {
            log::info!("Already on chainId: {}", required_hex);
            return Ok(NetworkCheck::AlreadyOnTarget);
        }

        log::info!("Wallet on chain {}, requesting switch to {}", chain_id_to_hex(current), required_hex);
        match self.provider.switch_chain(&required_hex).await {
            Ok(()) => {
                log::info!("Switched to chainId: {}", required_hex);
                Ok(NetworkCheck::Switched { from: current })
            }
            Err(e) if e.is_user_rejection() => {
                log::warn!("Network switch to {} rejected by user", required_hex);
                Err(DeployError::SwitchRejected(required_hex))
            }
            Err(e) => {
                log::error!("Network switch failed: {}", e);
                Err(DeployError::switch_failed(e.to_string()))
            }
        }
    }
}
