//! Polling event watcher
//!
//! HTTP endpoints cannot push `accountsChanged` / `chainChanged`, so the
//! watcher polls `eth_accounts` and `eth_chainId` and emits an event whenever
//! either differs from the previous observation.

use super::{ProviderEvent, RpcWalletProvider, WalletProvider};
use crate::shared::constants::DEFAULT_EVENT_POLL_INTERVAL_MS;
use crate::shared::types::{Address, ChainId};
use ethers::providers::JsonRpcClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Last observed wallet state
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventWatcher {
    accounts: Option<Vec<Address>>,
    chain_id: Option<ChainId>,
}

impl EventWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation and return the events it implies. The first
    /// observation only establishes the baseline.
    pub fn observe(&mut self, accounts: Vec<Address>, chain_id: ChainId) -> Vec<ProviderEvent> {
        let mut events = Vec::new();

        match &self.accounts {
            Some(previous) if *previous != accounts => {
                events.push(ProviderEvent::AccountsChanged(accounts.clone()));
            }
            _ => {}
        }
        if matches!(self.chain_id, Some(previous) if previous != chain_id) {
            events.push(ProviderEvent::ChainChanged(chain_id));
        }

        self.accounts = Some(accounts);
        self.chain_id = Some(chain_id);
        events
    }

    /// Poll the provider until the returned handle is aborted. A zero
    /// interval falls back to the default.
    pub fn spawn<P>(provider: Arc<RpcWalletProvider<P>>, interval: Duration) -> JoinHandle<()>
    where
        P: JsonRpcClient + 'static,
    {
        let interval = if interval.is_zero() {
            log::warn!("Event poll interval is zero, using {} ms", DEFAULT_EVENT_POLL_INTERVAL_MS);
            Duration::from_millis(DEFAULT_EVENT_POLL_INTERVAL_MS)
        } else {
            interval
        };

        tokio::spawn(async move {
            let mut watcher = EventWatcher::new();
            let sender = provider.event_sender();
            let mut ticker = tokio::time::interval(interval);
            log::debug!("Wallet event watcher started ({:?} interval)", interval);

            loop {
                ticker.tick().await;
                let observation = async {
                    let accounts = provider.accounts().await?;
                    let chain_id = provider.chain_id().await?;
                    Ok::<_, super::ProviderError>((accounts, chain_id))
                }
                .await;

                match observation {
                    Ok((accounts, chain_id)) => {
                        for event in watcher.observe(accounts, chain_id) {
                            log::info!("Wallet event: {:?}", event);
                            // no subscribers is fine, the event is simply dropped
                            let _ = sender.send(event);
                        }
                    }
                    Err(e) => log::warn!("Wallet event poll failed: {}", e),
                }
            }
        })
    }
}
