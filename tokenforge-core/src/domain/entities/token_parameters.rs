//! Token parameters entity
//!
//! The values a user enters before deployment. Serialized field names match
//! the stored `tokenData` record so existing sessions load unchanged.

use crate::shared::error::DeployError;
use ethers::abi::Token;
use ethers::types::U256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParameters {
    pub name: String,
    pub symbol: String,
    /// Initial supply as a decimal integer string
    pub supply: String,
    /// Logo encoded as a `data:` URL, empty when none was chosen
    #[serde(rename = "logo", default)]
    pub logo_data_url: String,
    #[serde(rename = "network", default)]
    pub network_id: String,
}

impl TokenParameters {
    /// Build and validate parameters from raw form input. Text fields are trimmed.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        supply: impl Into<String>,
        logo_data_url: impl Into<String>,
        network_id: impl Into<String>,
    ) -> Result<Self, DeployError> {
        let params = Self {
            name: name.into().trim().to_string(),
            symbol: symbol.into().trim().to_string(),
            supply: supply.into().trim().to_string(),
            logo_data_url: logo_data_url.into(),
            network_id: network_id.into().trim().to_string(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), DeployError> {
        if self.name.trim().is_empty() || self.symbol.trim().is_empty() || self.supply.trim().is_empty() {
            return Err(DeployError::validation(
                "Please fill in all required fields (Name, Symbol, Supply)",
            ));
        }
        self.supply_amount()?;
        if !self.logo_data_url.is_empty() && !self.logo_data_url.starts_with("data:") {
            return Err(DeployError::validation("Logo must be a data: URL"));
        }
        Ok(())
    }

    /// The supply as a 256-bit integer. Zero, negative, fractional and
    /// non-numeric supplies are rejected.
    pub fn supply_amount(&self) -> Result<U256, DeployError> {
        let supply = self.supply.trim();
        if supply.is_empty() || !supply.chars().all(|c| c.is_ascii_digit()) {
            return Err(DeployError::validation("Supply must be a positive number"));
        }
        let amount = U256::from_dec_str(supply)
            .map_err(|_| DeployError::validation("Supply exceeds the 256-bit range"))?;
        if amount.is_zero() {
            return Err(DeployError::validation("Supply must be a positive number"));
        }
        Ok(amount)
    }

    /// Ordered constructor arguments: name, symbol, supply
    pub fn constructor_arguments(&self) -> Result<Vec<Token>, DeployError> {
        Ok(vec![
            Token::String(self.name.clone()),
            Token::String(self.symbol.clone()),
            Token::Uint(self.supply_amount()?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_parameters() {
        let params = TokenParameters::new(" Test ", "TST", "1000000", "", "bsc-testnet")
            .expect("Failed to build parameters");
        assert_eq!(params.name, "Test");
        assert_eq!(params.supply_amount().expect("Failed to parse supply"), U256::from(1_000_000u64));
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert!(TokenParameters::new("", "TST", "1", "", "").is_err());
        assert!(TokenParameters::new("Test", "   ", "1", "", "").is_err());
        assert!(TokenParameters::new("Test", "TST", "", "", "").is_err());
    }

    #[test]
    fn test_invalid_supply_rejected() {
        for supply in ["0", "-5", "1.5", "abc", "1e18"] {
            let result = TokenParameters::new("Test", "TST", supply, "", "");
            assert!(matches!(result, Err(DeployError::Validation(_))), "supply {supply} accepted");
        }
    }

    #[test]
    fn test_large_supply_keeps_precision() {
        let supply = "1000000000000000000000000000";
        let params = TokenParameters::new("Big", "BIG", supply, "", "").expect("Failed to build parameters");
        assert_eq!(params.supply_amount().expect("Failed to parse supply").to_string(), supply);
    }

    #[test]
    fn test_logo_must_be_data_url() {
        assert!(TokenParameters::new("Test", "TST", "1", "https://example.com/logo.png", "").is_err());
        assert!(TokenParameters::new("Test", "TST", "1", "data:image/png;base64,AAAA", "").is_ok());
    }

    #[test]
    fn test_constructor_argument_order() {
        let params = TokenParameters::new("Test", "TST", "42", "", "").expect("Failed to build parameters");
        let args = params.constructor_arguments().expect("Failed to build arguments");
        assert_eq!(
            args,
            vec![
                Token::String("Test".into()),
                Token::String("TST".into()),
                Token::Uint(U256::from(42u64)),
            ]
        );
    }

    #[test]
    fn test_stored_field_names() {
        let json = r#"{"name":"Test","symbol":"TST","supply":"10","logo":"","network":"bsc-testnet"}"#;
        let params: TokenParameters = serde_json::from_str(json).expect("Failed to parse stored record");
        assert_eq!(params.network_id, "bsc-testnet");
        assert!(params.validate().is_ok());
    }
}
