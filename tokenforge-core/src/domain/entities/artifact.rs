//! Contract artifact entity
//!
//! Compiled token contract: its ABI and creation bytecode.

use crate::shared::error::DeployError;
use crate::shared::utils::hex_to_bytes;
use ethers::abi::{Abi, Token};
use ethers::types::Bytes;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ContractArtifact {
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn new(abi: Abi, bytecode: Bytes) -> Result<Self, DeployError> {
        if bytecode.is_empty() {
            return Err(DeployError::artifact("Contract bytecode is empty"));
        }
        Ok(Self { abi, bytecode })
    }

    /// Parse the interface and bytecode documents.
    ///
    /// The interface document is either a bare ABI array or an object with an
    /// `abi` field. The bytecode document is `{"bytecode": "0x.."}`, where the
    /// value may also be an object carrying the hex under `object`.
    pub fn from_documents(interface: Value, bytecode: Value) -> Result<Self, DeployError> {
        let abi_value = match interface {
            Value::Object(mut map) => map
                .remove("abi")
                .ok_or_else(|| DeployError::artifact("Interface document has no abi field"))?,
            other => other,
        };
        let abi: Abi = serde_json::from_value(abi_value)
            .map_err(|e| DeployError::artifact(format!("Invalid interface descriptor: {}", e)))?;

        let code = match &bytecode {
            Value::String(code) => Some(code.as_str()),
            Value::Object(map) => match map.get("bytecode") {
                Some(Value::String(code)) => Some(code.as_str()),
                Some(Value::Object(inner)) => inner.get("object").and_then(Value::as_str),
                _ => None,
            },
            _ => None,
        }
        .ok_or_else(|| DeployError::artifact("Bytecode document has no bytecode field"))?;
        let code = hex_to_bytes(code)
            .map_err(|e| DeployError::artifact(format!("Malformed bytecode: {}", e)))?;

        Self::new(abi, Bytes::from(code))
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments
    pub fn deployment_data(&self, arguments: &[Token]) -> Result<Bytes, DeployError> {
        match self.abi.constructor() {
            Some(constructor) => {
                let data = constructor.encode_input(self.bytecode.to_vec(), arguments)?;
                Ok(Bytes::from(data))
            }
            None if arguments.is_empty() => Ok(self.bytecode.clone()),
            None => Err(DeployError::estimation(
                "Interface declares no constructor but arguments were supplied",
            )),
        }
    }
}
