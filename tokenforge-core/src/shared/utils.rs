//! Utility functions for the deployment pipeline
//!
//! Chain id formatting, address checks and display conversions.

use crate::shared::constants::ADDRESS_HEX_LENGTH;
use crate::shared::error::DeployError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ethers::types::U256;

/// Generate a unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Format a chain id the way wallet providers expect it (`0x61`)
pub fn chain_id_to_hex(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

/// Validate Ethereum address format
pub fn validate_ethereum_address(address: &str) -> Result<(), DeployError> {
    if !address.starts_with("0x") {
        return Err(DeployError::validation("Address must start with 0x"));
    }

    if address.len() != ADDRESS_HEX_LENGTH {
        return Err(DeployError::validation("Address must be 42 characters long"));
    }

    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DeployError::validation("Address contains invalid hex characters"));
    }

    Ok(())
}

/// Convert hex string to bytes
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, DeployError> {
    let hex = hex.trim().trim_start_matches("0x");
    Ok(hex::decode(hex)?)
}

/// Convert an amount in the smallest unit to the native currency unit.
///
/// Exact decimal conversion, trailing zeros trimmed (`1.500000` -> `1.5`).
pub fn format_native(amount: U256, decimals: u32) -> Result<String, DeployError> {
    let formatted = ethers::utils::format_units(amount, decimals)
        .map_err(|e| DeployError::validation(format!("Amount conversion failed: {}", e)))?;
    if !formatted.contains('.') {
        return Ok(formatted);
    }
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    Ok(trimmed.to_string())
}

/// Encode a logo file as a `data:` URL
pub fn logo_data_url(file_name: &str, bytes: &[u8]) -> String {
    let extension = file_name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    let mime = match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}
