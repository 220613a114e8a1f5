//! Fee estimation
//!
//! Prices the deployment of a token contract: constructor call data from the
//! artifact and parameters, the network gas price, and a gas estimate from the
//! connected account. All arithmetic stays in `U256`.

use crate::domain::entities::{ContractArtifact, FeeQuote, TokenParameters};
use crate::infrastructure::provider::WalletProvider;
use crate::shared::error::DeployError;
use crate::shared::types::{Address, Bytes};
use std::sync::Arc;

/// Call data together with its price at the moment it was computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedDeployment {
    pub call_data: Bytes,
    pub quote: FeeQuote,
}

pub struct FeeEstimator {
    provider: Arc<dyn WalletProvider>,
}

impl FeeEstimator {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    /// Quote the cost of deploying `artifact` with `params` from `from`
    pub async fn estimate(
        &self,
        artifact: &ContractArtifact,
        params: &TokenParameters,
        from: Address,
    ) -> Result<FeeQuote, DeployError> {
        log::info!("Calculating fees with params: {} ({}) supply {}", params.name, params.symbol, params.supply);
        let priced = self.price(artifact, params, from).await.map_err(|e| {
            log::error!("Fee calculation failed: {}", e);
            DeployError::estimation(e)
        })?;

        log::info!("Gas Price: {}", priced.quote.gas_price_wei);
        log::info!("Gas Estimate: {}", priced.quote.gas_estimate_units);
        log::info!("Total Fee: {} wei", priced.quote.total_fee_wei);
        Ok(priced.quote)
    }

    /// Build the call data and price it against current network conditions.
    /// Errors are returned as bare reasons so each stage can wrap them.
    pub(crate) async fn price(
        &self,
        artifact: &ContractArtifact,
        params: &TokenParameters,
        from: Address,
    ) -> Result<PricedDeployment, String> {
        let arguments = params
            .constructor_arguments()
            .map_err(|e| format!("Invalid constructor arguments: {}", e.detail()))?;
        let call_data = artifact
            .deployment_data(&arguments)
            .map_err(|e| format!("Failed to encode deployment data: {}", e.detail()))?;

        let gas_price = self
            .provider
            .gas_price()
            .await
            .map_err(|e| format!("Failed to get gas price: {}", e))?;
        let gas_estimate = self
            .provider
            .estimate_gas(&call_data, from)
            .await
            .map_err(|e| format!("Gas estimation failed: {}", e))?;

        let quote = FeeQuote::new(gas_price, gas_estimate).map_err(|e| e.detail())?;
        Ok(PricedDeployment { call_data, quote })
    }
}
