//! Deployment execution
//!
//! Submits the contract creation transaction. Gas is re-priced at submission
//! time rather than taken from an earlier quote, since network conditions may
//! have moved in between.

use crate::core::fees::FeeEstimator;
use crate::domain::entities::{ContractArtifact, DeploymentResult, TokenParameters};
use crate::infrastructure::provider::{DeploymentRequest, WalletProvider};
use crate::shared::error::DeployError;
use crate::shared::types::Address;
use crate::shared::utils::generate_id;
use std::sync::Arc;

pub struct DeploymentExecutor {
    provider: Arc<dyn WalletProvider>,
    estimator: FeeEstimator,
}

impl DeploymentExecutor {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            estimator: FeeEstimator::new(provider.clone()),
            provider,
        }
    }

    /// Deploy the token contract from `from` and wait for inclusion.
    ///
    /// Not idempotent: every call submits a new transaction.
    pub async fn deploy(
        &self,
        artifact: &ContractArtifact,
        params: &TokenParameters,
        from: Address,
    ) -> Result<DeploymentResult, DeployError> {
        let attempt = generate_id();
        log::info!("[{}] Deploying contract with params: {} ({})", attempt, params.name, params.symbol);

        let priced = self.estimator.price(artifact, params, from).await.map_err(|e| {
            log::error!("[{}] Deployment failed while pricing: {}", attempt, e);
            DeployError::deployment(e)
        })?;

        let request = DeploymentRequest {
            from,
            data: priced.call_data,
            gas: priced.quote.gas_estimate_units,
            gas_price: priced.quote.gas_price_wei,
        };
        let receipt = self.provider.send_transaction(request).await.map_err(|e| {
            log::error!("[{}] Deployment failed: {}", attempt, e);
            DeployError::deployment(e.to_string())
        })?;

        if receipt.status == Some(0) {
            log::error!("[{}] Deployment transaction {:?} reverted", attempt, receipt.transaction_hash);
            return Err(DeployError::deployment(format!(
                "Transaction {:?} reverted",
                receipt.transaction_hash
            )));
        }
        let contract_address = receipt.contract_address.ok_or_else(|| {
            DeployError::deployment(format!(
                "Receipt for {:?} carries no contract address",
                receipt.transaction_hash
            ))
        })?;

        let result = DeploymentResult {
            transaction_hash: Some(receipt.transaction_hash),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            ..DeploymentResult::new(contract_address)
        };
        log::info!("[{}] Contract deployed at: {}", attempt, result.address_string());
        Ok(result)
    }
}
