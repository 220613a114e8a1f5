//! Fee quote entity
//!
//! A quote is presentational: it reserves nothing and is recomputed whenever
//! parameters or the network change.

use crate::shared::constants::NetworkConfig;
use crate::shared::error::DeployError;
use crate::shared::types::{GasUnits, Wei};
use crate::shared::utils::format_native;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub gas_price_wei: Wei,
    pub gas_estimate_units: GasUnits,
    pub total_fee_wei: Wei,
}

impl FeeQuote {
    /// Exact product of price and estimate. A product beyond 256 bits is an
    /// error rather than a wrapped value.
    pub fn new(gas_price_wei: Wei, gas_estimate_units: GasUnits) -> Result<Self, DeployError> {
        let total_fee_wei = gas_price_wei
            .checked_mul(gas_estimate_units)
            .ok_or_else(|| DeployError::estimation("Fee exceeds the 256-bit range"))?;
        Ok(Self {
            gas_price_wei,
            gas_estimate_units,
            total_fee_wei,
        })
    }

    /// Total fee in the network's native unit, e.g. `0.0042 BNB`
    pub fn display(&self, network: &NetworkConfig) -> Result<String, DeployError> {
        let amount = format_native(self.total_fee_wei, network.decimals)?;
        Ok(format!("{} {}", amount, network.native_currency))
    }
}
