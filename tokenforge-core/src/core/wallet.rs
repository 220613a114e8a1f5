//! Wallet connector
//!
//! Establishes the session with the wallet provider and exposes its
//! account/chain change events as a subscription.

use crate::domain::entities::WalletSession;
use crate::infrastructure::provider::{ProviderError, ProviderEvent, WalletProvider};
use crate::shared::error::DeployError;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

pub struct WalletConnector {
    provider: Option<Arc<dyn WalletProvider>>,
}

impl WalletConnector {
    /// `None` models a page with no injected wallet
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider(&self) -> Result<Arc<dyn WalletProvider>, DeployError> {
        self.provider.clone().ok_or(DeployError::ProviderUnavailable)
    }

    /// Request account access and read the active chain
    pub async fn connect(&self) -> Result<WalletSession, DeployError> {
        let provider = self.provider()?;

        let accounts = provider.request_accounts().await.map_err(|e| {
            if e.is_user_rejection() {
                DeployError::UserRejected
            } else {
                DeployError::Provider(e)
            }
        })?;
        let account = *accounts.first().ok_or(DeployError::NoAccounts)?;

        let chain_id = provider.chain_id().await?;
        log::info!("Connected to wallet, account: {:?} on chain {}", account, chain_id);
        Ok(WalletSession::new(account, chain_id))
    }

    /// Register for provider events. Dropping the subscription deregisters it.
    pub fn subscribe(&self) -> Result<SessionSubscription, DeployError> {
        Ok(SessionSubscription {
            receiver: self.provider()?.subscribe(),
        })
    }
}

/// Live registration for account and chain change events
pub struct SessionSubscription {
    receiver: broadcast::Receiver<ProviderEvent>,
}

impl SessionSubscription {
    /// Next event, or `None` once the provider has gone away
    pub async fn recv(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} wallet events", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-delivered event without waiting
    pub fn try_recv(&mut self) -> Option<ProviderEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Missed {} wallet events", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
