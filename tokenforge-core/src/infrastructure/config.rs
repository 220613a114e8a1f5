//! Runtime configuration
//!
//! Read from `.env` (if present) and `TOKENFORGE_*` environment variables,
//! falling back to safe defaults. The target network is not configurable.

use crate::shared::constants::{
    NetworkConfig, DEFAULT_ABI_DOCUMENT, DEFAULT_ARTIFACT_SOURCE, DEFAULT_BYTECODE_DOCUMENT, DEFAULT_CONFIRMATIONS,
    DEFAULT_DATA_DIR, DEFAULT_EVENT_POLL_INTERVAL_MS, DEFAULT_RPC_URL, REQUIRED_NETWORK,
};
use crate::shared::error::DeployError;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Wallet JSON-RPC endpoint
    pub rpc_url: String,
    /// Directory or `http(s)://` base URL holding the artifact documents
    pub artifact_source: String,
    pub abi_document: String,
    pub bytecode_document: String,
    /// Where the parameter store keeps its file
    pub data_dir: PathBuf,
    pub confirmations: usize,
    pub event_poll_interval_ms: u64,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            artifact_source: DEFAULT_ARTIFACT_SOURCE.to_string(),
            abi_document: DEFAULT_ABI_DOCUMENT.to_string(),
            bytecode_document: DEFAULT_BYTECODE_DOCUMENT.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            confirmations: DEFAULT_CONFIRMATIONS,
            event_poll_interval_ms: DEFAULT_EVENT_POLL_INTERVAL_MS,
        }
    }
}

impl DeployerConfig {
    /// Load configuration from .env and the process environment
    pub fn from_env() -> Result<Self, DeployError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DeployError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let confirmations = match var("TOKENFORGE_CONFIRMATIONS") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| DeployError::config(format!("Invalid TOKENFORGE_CONFIRMATIONS: {}", value)))?,
            None => defaults.confirmations,
        };
        let event_poll_interval_ms = match var("TOKENFORGE_EVENT_POLL_INTERVAL_MS") {
            // zero would make the watcher's ticker panic
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| DeployError::config(format!("Invalid TOKENFORGE_EVENT_POLL_INTERVAL_MS: {}", value)))?,
            None => defaults.event_poll_interval_ms,
        };

        Ok(Self {
            rpc_url: var("TOKENFORGE_RPC_URL").unwrap_or(defaults.rpc_url),
            artifact_source: var("TOKENFORGE_ARTIFACT_SOURCE").unwrap_or(defaults.artifact_source),
            abi_document: var("TOKENFORGE_ABI_DOCUMENT").unwrap_or(defaults.abi_document),
            bytecode_document: var("TOKENFORGE_BYTECODE_DOCUMENT").unwrap_or(defaults.bytecode_document),
            data_dir: var("TOKENFORGE_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            confirmations,
            event_poll_interval_ms,
        })
    }

    /// Problems that would make the pipeline fail; empty when usable
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            errors.push(format!("RPC URL must be http(s): {}", self.rpc_url));
        }
        if self.artifact_source.trim().is_empty() {
            errors.push("Artifact source cannot be empty".to_string());
        }
        if self.abi_document.trim().is_empty() || self.bytecode_document.trim().is_empty() {
            errors.push("Artifact document names cannot be empty".to_string());
        }
        if self.event_poll_interval_ms == 0 {
            errors.push("Event poll interval must be greater than zero".to_string());
        }
        errors
    }

    pub fn required_network(&self) -> &'static NetworkConfig {
        REQUIRED_NETWORK
    }

    pub fn event_poll_interval(&self) -> Duration {
        Duration::from_millis(self.event_poll_interval_ms)
    }
}
