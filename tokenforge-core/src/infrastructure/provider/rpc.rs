//! JSON-RPC wallet provider
//!
//! Speaks the EIP-1193 method set to a wallet endpoint (a browser wallet
//! bridge or a node managing unlocked accounts) through an `ethers` provider.

use super::{DeploymentReceipt, DeploymentRequest, ProviderError, ProviderEvent, WalletProvider};
use crate::shared::constants::{DEFAULT_CONFIRMATIONS, EVENT_CHANNEL_CAPACITY};
use crate::shared::error::DeployError;
use crate::shared::types::{Address, Bytes, GasUnits, Wei};
use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{TransactionRequest, U256};
use serde_json::{json, Value};
use tokio::sync::broadcast;

pub struct RpcWalletProvider<P = Http> {
    provider: Provider<P>,
    confirmations: usize,
    events: broadcast::Sender<ProviderEvent>,
}

impl RpcWalletProvider<Http> {
    /// Create a provider for an HTTP JSON-RPC endpoint
    pub fn connect(rpc_url: &str) -> Result<Self, DeployError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| DeployError::config(format!("Failed to create HTTP provider for {}: {}", rpc_url, e)))?;
        Ok(Self::new(provider))
    }
}

impl<P: JsonRpcClient> RpcWalletProvider<P> {
    pub fn new(provider: Provider<P>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            confirmations: DEFAULT_CONFIRMATIONS,
            events,
        }
    }

    /// Blocks to wait for after inclusion before a deployment counts as done
    pub fn with_confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Accounts already authorized, without prompting the user
    pub async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.provider.get_accounts().await?)
    }

    /// Sender half of the event channel, used by the event watcher
    pub(crate) fn event_sender(&self) -> broadcast::Sender<ProviderEvent> {
        self.events.clone()
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> WalletProvider for RpcWalletProvider<P> {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let accounts: Vec<Address> = self.provider.request("eth_requestAccounts", ()).await?;
        Ok(accounts)
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let chain_id = self.provider.get_chainid().await?;
        if chain_id > U256::from(u64::MAX) {
            return Err(ProviderError::Transport(format!("Chain id {} out of range", chain_id)));
        }
        Ok(chain_id.as_u64())
    }

    async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError> {
        let params = [json!({ "chainId": chain_id_hex })];
        let _: Value = self.provider.request("wallet_switchEthereumChain", params).await?;
        Ok(())
    }

    async fn gas_price(&self) -> Result<Wei, ProviderError> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn estimate_gas(&self, call_data: &Bytes, from: Address) -> Result<GasUnits, ProviderError> {
        let tx: TypedTransaction = TransactionRequest::new().from(from).data(call_data.clone()).into();
        Ok(self.provider.estimate_gas(&tx, None).await?)
    }

    async fn send_transaction(&self, request: DeploymentRequest) -> Result<DeploymentReceipt, ProviderError> {
        let tx = TransactionRequest::new()
            .from(request.from)
            .data(request.data)
            .gas(request.gas)
            .gas_price(request.gas_price);

        let pending = self.provider.send_transaction(tx, None).await?;
        let tx_hash = pending.tx_hash();
        log::info!("Deployment transaction submitted: {:?}", tx_hash);

        let receipt = pending
            .confirmations(self.confirmations)
            .await?
            .ok_or_else(|| ProviderError::Transport(format!("Transaction {:?} was dropped", tx_hash)))?;

        Ok(DeploymentReceipt {
            transaction_hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            gas_used: receipt.gas_used,
            status: receipt.status.map(|s| s.as_u64()),
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
