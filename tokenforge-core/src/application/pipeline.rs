//! Deployment pipeline controller
//!
//! Drives a single deployment attempt through its stages:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> (NetworkMismatch -> Switching)*
//!     -> Ready -> Estimating -> QuoteReady -> Deploying -> Deployed | Failed
//! ```
//!
//! Every stage that waits on the wallet is raced against the provider event
//! subscription. A change to another chain abandons the attempt and asks for
//! a reload. An empty account list tears the session down and redirects to
//! the entry step (once). Any other account change, or a `chainChanged` for
//! the chain the session is already on, is applied once the stage completes.
//!
//! A reload that lands while a deployment is being submitted ends the run:
//! the transaction may already be out, so it is never resubmitted.

use crate::core::artifacts::ArtifactLoader;
use crate::core::deployment::DeploymentExecutor;
use crate::core::fees::FeeEstimator;
use crate::core::network::{NetworkCheck, NetworkGuarantor};
use crate::core::wallet::{SessionSubscription, WalletConnector};
use crate::domain::entities::{ContractArtifact, DeploymentResult, FeeQuote, TokenParameters, WalletSession};
use crate::domain::repositories::ParameterStore;
use crate::infrastructure::provider::ProviderEvent;
use crate::infrastructure::status::StatusSink;
use crate::shared::constants::{NetworkConfig, REQUIRED_NETWORK};
use crate::shared::error::DeployError;
use crate::shared::types::ChainId;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Disconnected,
    Connecting,
    Connected,
    NetworkMismatch,
    Switching,
    Ready,
    Estimating,
    QuoteReady,
    Deploying,
    Deployed,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Navigation requested by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSignal {
    /// Send the user back to parameter entry
    RedirectToEntry,
    /// The chain changed; everything must be initialized again
    Reload,
}

/// Why a stage did not produce its value
#[derive(Debug, Clone, PartialEq)]
pub enum Halt {
    Failed(DeployError),
    Signal(FlowSignal),
}

impl From<DeployError> for Halt {
    fn from(err: DeployError) -> Self {
        Self::Failed(err)
    }
}

pub type StageResult<T> = Result<T, Halt>;

/// How a full run ended
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    Deployed(DeploymentResult),
    Declined,
    Failed(DeployError),
    Signal(FlowSignal),
}

/// Asks the user whether to go ahead with the deployment
#[async_trait]
pub trait DeployConfirmation: Send + Sync {
    /// `quote` is `None` when estimation failed
    async fn confirm(&self, params: &TokenParameters, quote: Option<&FeeQuote>) -> bool;
}

/// Confirms every deployment without asking
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

#[async_trait]
impl DeployConfirmation for AutoConfirm {
    async fn confirm(&self, _params: &TokenParameters, _quote: Option<&FeeQuote>) -> bool {
        true
    }
}

enum Raced<T> {
    Completed(T),
    Interrupted(ProviderEvent),
}

/// Run `stage` to completion unless an event invalidating a session on
/// `current_chain` arrives first. Other events are queued in `deferred`.
async fn race<T>(
    subscription: Option<&mut SessionSubscription>,
    deferred: &mut Vec<ProviderEvent>,
    current_chain: Option<ChainId>,
    stage: impl Future<Output = T>,
) -> Raced<T> {
    let Some(subscription) = subscription else {
        return Raced::Completed(stage.await);
    };
    tokio::pin!(stage);

    loop {
        tokio::select! {
            biased;
            event = subscription.recv() => match event {
                Some(event) if event.invalidates_flow(current_chain) => return Raced::Interrupted(event),
                Some(event) => deferred.push(event),
                None => break,
            },
            output = &mut stage => return Raced::Completed(output),
        }
    }
    // provider gone, nothing left to race against
    Raced::Completed(stage.await)
}

pub struct DeploymentController {
    connector: WalletConnector,
    store: Arc<dyn ParameterStore>,
    loader: ArtifactLoader,
    sink: Arc<dyn StatusSink>,
    network: &'static NetworkConfig,
    state: PipelineState,
    session: Option<WalletSession>,
    params: Option<TokenParameters>,
    artifact: Option<ContractArtifact>,
    quote: Option<FeeQuote>,
    subscription: Option<SessionSubscription>,
    deferred: Vec<ProviderEvent>,
    redirected: bool,
    deployment_abandoned: bool,
    last_error: Option<DeployError>,
}

impl DeploymentController {
    pub fn new(
        connector: WalletConnector,
        store: Arc<dyn ParameterStore>,
        loader: ArtifactLoader,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            connector,
            store,
            loader,
            sink,
            network: REQUIRED_NETWORK,
            state: PipelineState::Disconnected,
            session: None,
            params: None,
            artifact: None,
            quote: None,
            subscription: None,
            deferred: Vec::new(),
            redirected: false,
            deployment_abandoned: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn session(&self) -> Option<WalletSession> {
        self.session
    }

    pub fn params(&self) -> Option<&TokenParameters> {
        self.params.as_ref()
    }

    pub fn quote(&self) -> Option<FeeQuote> {
        self.quote
    }

    pub fn last_error(&self) -> Option<&DeployError> {
        self.last_error.as_ref()
    }

    pub fn network(&self) -> &'static NetworkConfig {
        self.network
    }

    /// Entry step: validate, connect the wallet, persist the parameters
    pub async fn submit_parameters(&mut self, params: TokenParameters) -> Result<WalletSession, DeployError> {
        let outcome = async {
            params.validate()?;
            let session = self.connector.connect().await?;
            self.store.save(&params)?;
            log::info!("Token data saved: {} ({}) supply {}", params.name, params.symbol, params.supply);
            Ok::<_, DeployError>(session)
        }
        .await;

        match outcome {
            Ok(session) => {
                self.sink.show_status(&format!("Token {} saved, ready to deploy", params.symbol));
                Ok(session)
            }
            Err(e) => {
                log::error!("Failed to submit token parameters: {}", e);
                self.sink.show_status(&user_message(&e));
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Subscribe to wallet events, connect, then load the persisted
    /// parameters and the contract artifact
    pub async fn initialize(&mut self) -> StageResult<WalletSession> {
        log::info!("Initializing deployment flow");
        self.teardown();
        self.redirected = false;
        self.deployment_abandoned = false;
        self.last_error = None;

        match self.connector.subscribe() {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(e) => return Err(self.abort(e)),
        }

        self.state = PipelineState::Connecting;
        let raced = race(self.subscription.as_mut(), &mut self.deferred, None, self.connector.connect()).await;
        let session = self.settle(raced)?;
        self.session = Some(session);
        self.state = PipelineState::Connected;
        self.apply_deferred();

        let params = match self.store.load() {
            Ok(Some(params)) => params,
            Ok(None) => return Err(self.abort(DeployError::MissingParameters)),
            Err(e) => return Err(self.abort(e)),
        };
        log::info!("Token data loaded: {} ({})", params.name, params.symbol);
        self.params = Some(params);

        let chain = Some(session.chain_id);
        let raced = race(self.subscription.as_mut(), &mut self.deferred, chain, self.loader.load()).await;
        let artifact = self.settle(raced)?;
        self.artifact = Some(artifact);
        self.apply_deferred();

        self.require_session()
    }

    /// Drop the subscription and everything derived from the session
    pub fn teardown(&mut self) {
        if self.subscription.take().is_some() {
            log::debug!("Dropped wallet event subscription");
        }
        self.deferred.clear();
        self.session = None;
        self.params = None;
        self.artifact = None;
        self.quote = None;
        self.state = PipelineState::Disconnected;
    }

    /// Make sure the wallet is on the required network, then quote the fee
    pub async fn prepare(&mut self) -> StageResult<Option<FeeQuote>> {
        self.ensure_network().await?;
        self.estimate().await
    }

    pub async fn ensure_network(&mut self) -> StageResult<()> {
        let session = self.require_session()?;
        let provider = self.connector.provider().map_err(|e| self.abort(e))?;
        let required = self.network.chain_id;

        if !session.is_on(required) {
            self.state = PipelineState::NetworkMismatch;
            log::info!("Wallet on {}, {} required", session.chain_id_hex(), self.network.name);
            self.sink.show_status(&format!("Switching to {}...", self.network.name));
            self.state = PipelineState::Switching;
        }

        let guarantor = NetworkGuarantor::new(provider);
        let raced = race(
            self.subscription.as_mut(),
            &mut self.deferred,
            Some(required),
            guarantor.ensure_network(required),
        )
        .await;
        let check = self.settle(raced)?;
        if let NetworkCheck::Switched { from } = check {
            log::info!("Switched from chain {} to {}", from, required);
        }
        if let Some(session) = self.session.as_mut() {
            session.chain_id = required;
        }
        self.state = PipelineState::Ready;
        self.apply_deferred();
        Ok(())
    }

    /// Quote the deployment. A failed estimate is reported on the fee display
    /// and leaves the pipeline `Ready`, so deployment can still go ahead.
    pub async fn estimate(&mut self) -> StageResult<Option<FeeQuote>> {
        let session = self.require_session()?;
        let (artifact, params) = self.require_inputs()?;
        let provider = self.connector.provider().map_err(|e| self.abort(e))?;

        self.state = PipelineState::Estimating;
        self.quote = None;
        let estimator = FeeEstimator::new(provider);
        let raced = race(
            self.subscription.as_mut(),
            &mut self.deferred,
            Some(session.chain_id),
            estimator.estimate(&artifact, &params, session.account),
        )
        .await;

        let quoted = match raced {
            Raced::Interrupted(event) => return Err(self.interrupt(event)),
            Raced::Completed(result) => result.and_then(|quote| {
                let display = quote.display(self.network)?;
                Ok((quote, display))
            }),
        };
        self.apply_deferred();

        match quoted {
            Ok((quote, display)) => {
                self.sink.show_fee(&display);
                self.quote = Some(quote);
                self.state = PipelineState::QuoteReady;
                Ok(Some(quote))
            }
            Err(e) => {
                log::warn!("Continuing without a fee quote: {}", e);
                self.sink.show_fee(&format!("Fee calculation failed: {}", e.detail()));
                self.state = PipelineState::Ready;
                Ok(None)
            }
        }
    }

    /// Submit the deployment. Refused while another one is in flight.
    pub async fn deploy(&mut self) -> StageResult<DeploymentResult> {
        if self.state == PipelineState::Deploying {
            log::warn!("Deploy requested while a deployment is in flight");
            self.sink.show_status(&DeployError::DeploymentInFlight.to_string());
            return Err(Halt::Failed(DeployError::DeploymentInFlight));
        }
        let session = self.require_session()?;
        let (artifact, params) = self.require_inputs()?;
        let provider = self.connector.provider().map_err(|e| self.abort(e))?;

        self.state = PipelineState::Deploying;
        self.sink.show_status("Deploying contract...");
        let executor = DeploymentExecutor::new(provider);
        let raced = race(
            self.subscription.as_mut(),
            &mut self.deferred,
            Some(session.chain_id),
            executor.deploy(&artifact, &params, session.account),
        )
        .await;
        let result = self.settle(raced)?;

        self.state = PipelineState::Deployed;
        self.sink.show_status(&format!("Contract deployed at: {}", result.address_string()));
        self.sink
            .show_status(&format!("View on explorer: {}", result.explorer_url(self.network.block_explorer)));
        self.apply_deferred();
        Ok(result)
    }

    /// Turn a provider event into a state transition
    pub fn handle_event(&mut self, event: ProviderEvent) -> Option<FlowSignal> {
        match event {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                log::warn!("Accounts changed: wallet disconnected");
                self.teardown();
                self.sink.show_status("Wallet disconnected. Please reconnect.");
                self.signal_redirect()
            }
            ProviderEvent::AccountsChanged(accounts) => {
                log::info!("Accounts changed: {:?}", accounts);
                if let Some(session) = self.session.as_mut() {
                    session.account = accounts[0];
                }
                None
            }
            ProviderEvent::ChainChanged(chain_id) if self.session.is_some_and(|s| s.is_on(chain_id)) => {
                log::debug!("Chain changed to {}, session already there", chain_id);
                None
            }
            ProviderEvent::ChainChanged(chain_id) => {
                log::info!("Network changed to chain {}, reloading", chain_id);
                self.teardown();
                Some(FlowSignal::Reload)
            }
        }
    }

    /// Run the whole deploy flow. A chain change restarts it from
    /// initialization, unless it interrupted a submitted deployment; that
    /// ends the run with `Signal(Reload)`.
    pub async fn run(&mut self, confirmation: &dyn DeployConfirmation) -> FlowOutcome {
        loop {
            match self.attempt(confirmation).await {
                Ok(outcome) => return outcome,
                Err(Halt::Signal(FlowSignal::Reload)) if !self.deployment_abandoned => continue,
                Err(Halt::Signal(signal)) => return FlowOutcome::Signal(signal),
                Err(Halt::Failed(e)) => return FlowOutcome::Failed(e),
            }
        }
    }

    async fn attempt(&mut self, confirmation: &dyn DeployConfirmation) -> StageResult<FlowOutcome> {
        self.initialize().await?;
        let quote = self.prepare().await?;
        let (_, params) = self.require_inputs()?;
        let chain = self.session.map(|s| s.chain_id);

        let raced = race(
            self.subscription.as_mut(),
            &mut self.deferred,
            chain,
            confirmation.confirm(&params, quote.as_ref()),
        )
        .await;
        let confirmed = match raced {
            Raced::Completed(confirmed) => confirmed,
            Raced::Interrupted(event) => return Err(self.interrupt(event)),
        };
        self.apply_deferred();

        if !confirmed {
            log::info!("Deployment declined");
            self.sink.show_status("Deployment cancelled");
            return Ok(FlowOutcome::Declined);
        }
        Ok(FlowOutcome::Deployed(self.deploy().await?))
    }

    fn settle<T>(&mut self, raced: Raced<Result<T, DeployError>>) -> StageResult<T> {
        match raced {
            Raced::Completed(Ok(value)) => Ok(value),
            Raced::Completed(Err(e)) => Err(self.abort(e)),
            Raced::Interrupted(event) => Err(self.interrupt(event)),
        }
    }

    fn interrupt(&mut self, event: ProviderEvent) -> Halt {
        log::info!("Stage interrupted in state {} by {:?}", self.state, event);
        let deploying = self.state == PipelineState::Deploying;
        match self.handle_event(event) {
            Some(FlowSignal::Reload) if deploying => {
                log::warn!("Network changed with a deployment pending, not resubmitting");
                self.sink.show_status(
                    "Network changed while the deployment was pending. Check the transaction before deploying again.",
                );
                self.deployment_abandoned = true;
                Halt::Signal(FlowSignal::Reload)
            }
            Some(signal) => Halt::Signal(signal),
            None => Halt::Failed(DeployError::NotConnected),
        }
    }

    /// Report a failure. Connection failures and missing parameters also
    /// tear the session down and redirect to the entry step.
    fn abort(&mut self, error: DeployError) -> Halt {
        log::error!("Deployment flow failed in state {}: {}", self.state, error);
        self.sink.show_status(&user_message(&error));
        self.last_error = Some(error.clone());

        let redirect = error.is_connection_failure() || error == DeployError::MissingParameters;
        if redirect {
            self.teardown();
        }
        self.state = PipelineState::Failed;

        match redirect.then(|| self.signal_redirect()).flatten() {
            Some(signal) => Halt::Signal(signal),
            None => Halt::Failed(error),
        }
    }

    fn signal_redirect(&mut self) -> Option<FlowSignal> {
        if self.redirected {
            return None;
        }
        self.redirected = true;
        Some(FlowSignal::RedirectToEntry)
    }

    fn apply_deferred(&mut self) {
        for event in std::mem::take(&mut self.deferred) {
            self.handle_event(event);
        }
    }

    fn require_session(&mut self) -> StageResult<WalletSession> {
        match self.session {
            Some(session) => Ok(session),
            None => Err(self.abort(DeployError::NotConnected)),
        }
    }

    fn require_inputs(&mut self) -> StageResult<(ContractArtifact, TokenParameters)> {
        match (self.artifact.clone(), self.params.clone()) {
            (Some(artifact), Some(params)) => Ok((artifact, params)),
            (_, None) => Err(self.abort(DeployError::MissingParameters)),
            (None, _) => Err(self.abort(DeployError::artifact("Contract artifact not loaded"))),
        }
    }
}

fn user_message(error: &DeployError) -> String {
    match error {
        DeployError::MissingParameters => "No token data found. Please create a token first.".to_string(),
        e if e.is_connection_failure() => format!("Please connect your wallet to continue. ({})", e),
        e => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::artifact::tests::token_abi;
    use crate::domain::repositories::ArtifactSource;
    use crate::infrastructure::provider::{
        DeploymentReceipt, DeploymentRequest, MockWalletProvider, ProviderError, WalletProvider,
    };
    use crate::infrastructure::status::RecordingStatusSink;
    use crate::infrastructure::storage::MemoryParameterStore;
    use crate::shared::types::{Address, Bytes, ChainId, H256, U256};
    use crate::shared::utils::validate_ethereum_address;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::broadcast;
    use tokio_test::{assert_err, assert_ok};

    fn account() -> Address {
        Address::repeat_byte(0x11)
    }

    const GAS_PRICE: u64 = 10_000_000_000;
    const GAS_ESTIMATE: u64 = 1_500_000;

    struct StaticArtifactSource;

    #[async_trait]
    impl ArtifactSource for StaticArtifactSource {
        async fn fetch(&self, name: &str) -> Result<Value, DeployError> {
            match name {
                "contract1.json" => Ok(token_abi()),
                "contract2.json" => Ok(json!({ "bytecode": "0x60806040" })),
                other => Err(DeployError::artifact(format!("Unknown document {}", other))),
            }
        }

        fn location(&self) -> String {
            "memory".to_string()
        }
    }

    fn params() -> TokenParameters {
        TokenParameters::new("Test", "TST", "1000000", "", "bsc-testnet").expect("Failed to build parameters")
    }

    struct Harness {
        controller: DeploymentController,
        store: Arc<MemoryParameterStore>,
        sink: Arc<RecordingStatusSink>,
        events: broadcast::Sender<ProviderEvent>,
    }

    fn harness(provider: Option<MockWalletProvider>, stored: Option<TokenParameters>) -> Harness {
        let (events, _) = broadcast::channel(16);
        let provider = provider.map(|mut provider| {
            let sender = events.clone();
            provider.expect_subscribe().returning(move || sender.subscribe());
            Arc::new(provider) as Arc<dyn WalletProvider>
        });
        harness_with(provider, stored, events)
    }

    fn harness_with(
        provider: Option<Arc<dyn WalletProvider>>,
        stored: Option<TokenParameters>,
        events: broadcast::Sender<ProviderEvent>,
    ) -> Harness {
        let store = Arc::new(MemoryParameterStore::new());
        if let Some(params) = stored {
            store.save(&params).expect("Failed to save parameters");
        }
        let sink = Arc::new(RecordingStatusSink::new());
        let controller = DeploymentController::new(
            WalletConnector::new(provider),
            store.clone(),
            ArtifactLoader::new(Box::new(StaticArtifactSource)),
            sink.clone(),
        );
        Harness { controller, store, sink, events }
    }

    fn connected_provider(chain_id: u64) -> MockWalletProvider {
        let mut provider = MockWalletProvider::new();
        provider.expect_request_accounts().returning(|| Ok(vec![account()]));
        provider.expect_chain_id().returning(move || Ok(chain_id));
        provider
    }

    fn receipt() -> DeploymentReceipt {
        DeploymentReceipt {
            transaction_hash: H256::repeat_byte(0x42),
            contract_address: Some(Address::repeat_byte(0xcd)),
            block_number: Some(100),
            gas_used: Some(U256::from(GAS_ESTIMATE)),
            status: Some(1),
        }
    }

    #[tokio::test]
    async fn test_provider_absent() {
        let mut h = harness(None, Some(params()));

        let outcome = h.controller.run(&AutoConfirm).await;

        assert_eq!(outcome, FlowOutcome::Signal(FlowSignal::RedirectToEntry));
        assert_eq!(h.controller.last_error(), Some(&DeployError::ProviderUnavailable));
        assert_eq!(h.controller.state(), PipelineState::Failed);
        assert!(h.sink.last_status().expect("No status shown").contains("No wallet provider available"));
        assert!(h.sink.fees().is_empty());
    }

    #[tokio::test]
    async fn test_switch_rejected_stops_flow() {
        let mut provider = connected_provider(0x38);
        provider
            .expect_switch_chain()
            .with(mockall::predicate::eq("0x61"))
            .times(1)
            .returning(|_| Err(ProviderError::UserRejected));
        provider.expect_gas_price().never();
        provider.expect_estimate_gas().never();
        provider.expect_send_transaction().never();
        let mut h = harness(Some(provider), Some(params()));

        let outcome = h.controller.run(&AutoConfirm).await;

        assert_eq!(outcome, FlowOutcome::Failed(DeployError::SwitchRejected("0x61".into())));
        assert_eq!(h.controller.state(), PipelineState::Failed);
        assert!(h.sink.statuses().iter().any(|s| s.contains("Switching to BSC Testnet")));
    }

    #[tokio::test]
    async fn test_successful_flow() {
        let mut provider = connected_provider(97);
        provider.expect_switch_chain().never();
        provider.expect_gas_price().times(2).returning(|| Ok(U256::from(GAS_PRICE)));
        provider.expect_estimate_gas().times(2).returning(|_, _| Ok(U256::from(GAS_ESTIMATE)));
        provider
            .expect_send_transaction()
            .withf(|request: &DeploymentRequest| request.from == account())
            .times(1)
            .returning(|_| Ok(receipt()));
        let mut h = harness(Some(provider), Some(params()));

        let session = assert_ok!(h.controller.initialize().await);
        assert_eq!(session, WalletSession::new(account(), 97));
        assert_eq!(h.controller.state(), PipelineState::Connected);

        let quote = assert_ok!(h.controller.prepare().await).expect("No quote produced");
        assert_eq!(quote.total_fee_wei, U256::from(GAS_PRICE) * U256::from(GAS_ESTIMATE));
        assert_eq!(h.controller.state(), PipelineState::QuoteReady);
        assert_eq!(h.sink.fees(), vec!["0.015 BNB"]);

        let result = assert_ok!(h.controller.deploy().await);
        assert_eq!(h.controller.state(), PipelineState::Deployed);
        let address = result.address_string();
        assert!(address.starts_with("0x") && address.len() == 42);
        assert!(validate_ethereum_address(&address).is_ok());
        assert!(h.sink.statuses().iter().any(|s| s.contains(&address)));
    }

    #[tokio::test]
    async fn test_run_deploys_with_auto_confirm() {
        let mut provider = connected_provider(97);
        provider.expect_gas_price().returning(|| Ok(U256::from(GAS_PRICE)));
        provider.expect_estimate_gas().returning(|_, _| Ok(U256::from(GAS_ESTIMATE)));
        provider.expect_send_transaction().times(1).returning(|_| Ok(receipt()));
        let mut h = harness(Some(provider), Some(params()));

        match h.controller.run(&AutoConfirm).await {
            FlowOutcome::Deployed(result) => assert_eq!(result.contract_address, Address::repeat_byte(0xcd)),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    struct Decline;

    #[async_trait]
    impl DeployConfirmation for Decline {
        async fn confirm(&self, _params: &TokenParameters, _quote: Option<&FeeQuote>) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_declined_confirmation_skips_deploy() {
        let mut provider = connected_provider(97);
        provider.expect_gas_price().returning(|| Ok(U256::from(GAS_PRICE)));
        provider.expect_estimate_gas().returning(|_, _| Ok(U256::from(GAS_ESTIMATE)));
        provider.expect_send_transaction().never();
        let mut h = harness(Some(provider), Some(params()));

        assert_eq!(h.controller.run(&Decline).await, FlowOutcome::Declined);
        assert_eq!(h.controller.state(), PipelineState::QuoteReady);
    }

    #[tokio::test]
    async fn test_missing_parameters_redirects() {
        let mut provider = connected_provider(97);
        provider.expect_gas_price().never();
        let mut h = harness(Some(provider), None);

        let halt = assert_err!(h.controller.initialize().await);
        assert_eq!(halt, Halt::Signal(FlowSignal::RedirectToEntry));
        assert_eq!(h.controller.last_error(), Some(&DeployError::MissingParameters));
        assert_eq!(
            h.sink.last_status().as_deref(),
            Some("No token data found. Please create a token first.")
        );
    }

    #[tokio::test]
    async fn test_accounts_emptied_redirects_once() {
        let mut provider = connected_provider(97);
        provider.expect_switch_chain().never();
        provider.expect_gas_price().never();
        let mut h = harness(Some(provider), Some(params()));

        assert_ok!(h.controller.initialize().await);
        h.events.send(ProviderEvent::AccountsChanged(vec![])).expect("Failed to send event");
        h.events.send(ProviderEvent::AccountsChanged(vec![])).expect("Failed to send event");

        let halt = assert_err!(h.controller.prepare().await);
        assert_eq!(halt, Halt::Signal(FlowSignal::RedirectToEntry));
        assert_eq!(h.controller.session(), None);
        assert_eq!(h.controller.state(), PipelineState::Disconnected);

        // torn down: no second redirect, whatever arrives next
        assert_eq!(h.controller.handle_event(ProviderEvent::AccountsChanged(vec![])), None);
        let halt = assert_err!(h.controller.prepare().await);
        assert_eq!(halt, Halt::Failed(DeployError::NotConnected));

        let notices = h
            .sink
            .statuses()
            .iter()
            .filter(|s| s.as_str() == "Wallet disconnected. Please reconnect.")
            .count();
        assert_eq!(notices, 2);
    }

    #[tokio::test]
    async fn test_chain_change_requests_reload() {
        let mut provider = connected_provider(97);
        provider.expect_switch_chain().never();
        provider.expect_gas_price().never();
        let mut h = harness(Some(provider), Some(params()));

        assert_ok!(h.controller.initialize().await);
        h.events.send(ProviderEvent::ChainChanged(56)).expect("Failed to send event");

        let halt = assert_err!(h.controller.prepare().await);
        assert_eq!(halt, Halt::Signal(FlowSignal::Reload));
        assert_eq!(h.controller.session(), None);
        assert_eq!(h.controller.quote(), None);
    }

    #[tokio::test]
    async fn test_account_change_refreshes_session() {
        let replacement = Address::repeat_byte(0x22);
        let mut provider = connected_provider(97);
        provider.expect_gas_price().returning(|| Ok(U256::from(GAS_PRICE)));
        provider
            .expect_estimate_gas()
            .withf(move |_, from| *from == replacement)
            .returning(|_, _| Ok(U256::from(GAS_ESTIMATE)));
        let mut h = harness(Some(provider), Some(params()));

        assert_ok!(h.controller.initialize().await);
        h.events
            .send(ProviderEvent::AccountsChanged(vec![replacement]))
            .expect("Failed to send event");

        // the refresh lands once network verification completes
        assert_ok!(h.controller.ensure_network().await);
        assert_eq!(h.controller.session().map(|s| s.account), Some(replacement));
        assert!(assert_ok!(h.controller.estimate().await).is_some());
    }

    #[tokio::test]
    async fn test_estimation_failure_does_not_block_deploy() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let mut provider = connected_provider(97);
        provider.expect_gas_price().returning(|| Ok(U256::from(GAS_PRICE)));
        let counter = attempts.clone();
        provider.expect_estimate_gas().times(2).returning(move |_, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ProviderError::Rpc { code: -32000, message: "execution reverted".into() })
            } else {
                Ok(U256::from(GAS_ESTIMATE))
            }
        });
        provider.expect_send_transaction().times(1).returning(|_| Ok(receipt()));
        let mut h = harness(Some(provider), Some(params()));

        let outcome = h.controller.run(&AutoConfirm).await;

        assert!(matches!(outcome, FlowOutcome::Deployed(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let fees = h.sink.fees();
        assert_eq!(fees.len(), 1);
        assert!(fees[0].starts_with("Fee calculation failed"));
    }

    #[tokio::test]
    async fn test_deploy_failure_keeps_parameters() {
        let mut provider = connected_provider(97);
        provider.expect_gas_price().returning(|| Ok(U256::from(GAS_PRICE)));
        provider.expect_estimate_gas().returning(|_, _| Ok(U256::from(GAS_ESTIMATE)));
        provider.expect_send_transaction().times(1).returning(|_| {
            Err(ProviderError::Rpc { code: -32000, message: "insufficient funds for gas * price + value".into() })
        });
        let mut h = harness(Some(provider), Some(params()));

        match h.controller.run(&AutoConfirm).await {
            FlowOutcome::Failed(DeployError::DeploymentFailed(reason)) => {
                assert!(reason.contains("insufficient funds"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(h.controller.state(), PipelineState::Failed);
        assert_eq!(h.store.load().expect("Failed to load"), Some(params()));
        assert!(h.sink.last_status().expect("No status shown").starts_with("Deployment failed"));
    }

    #[tokio::test]
    async fn test_submit_parameters_persists_after_connecting() {
        let provider = connected_provider(97);
        let mut h = harness(Some(provider), None);

        let session = h.controller.submit_parameters(params()).await.expect("Failed to submit");
        assert_eq!(session.account, account());
        assert_eq!(h.store.load().expect("Failed to load"), Some(params()));
    }

    #[tokio::test]
    async fn test_submit_parameters_requires_wallet() {
        let mut h = harness(None, None);

        let result = h.controller.submit_parameters(params()).await;
        assert_eq!(result, Err(DeployError::ProviderUnavailable));
        assert_eq!(h.store.load().expect("Failed to load"), None);
    }

    /// Delegates to a mock but never completes a submitted transaction
    struct StalledDeploy(MockWalletProvider);

    #[async_trait]
    impl WalletProvider for StalledDeploy {
        async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
            self.0.request_accounts().await
        }

        async fn chain_id(&self) -> Result<u64, ProviderError> {
            self.0.chain_id().await
        }

        async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError> {
            self.0.switch_chain(chain_id_hex).await
        }

        async fn gas_price(&self) -> Result<U256, ProviderError> {
            self.0.gas_price().await
        }

        async fn estimate_gas(&self, call_data: &Bytes, from: Address) -> Result<U256, ProviderError> {
            self.0.estimate_gas(call_data, from).await
        }

        async fn send_transaction(&self, _request: DeploymentRequest) -> Result<DeploymentReceipt, ProviderError> {
            std::future::pending().await
        }

        fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
            self.0.subscribe()
        }
    }

    #[tokio::test]
    async fn test_deploy_refused_while_in_flight() {
        let (events, _) = broadcast::channel(16);
        let mut inner = connected_provider(97);
        inner.expect_gas_price().returning(|| Ok(U256::from(GAS_PRICE)));
        inner.expect_estimate_gas().returning(|_, _| Ok(U256::from(GAS_ESTIMATE)));
        let sender = events.clone();
        inner.expect_subscribe().returning(move || sender.subscribe());
        let provider: Arc<dyn WalletProvider> = Arc::new(StalledDeploy(inner));
        let mut h = harness_with(Some(provider), Some(params()), events);

        assert_ok!(h.controller.initialize().await);
        assert_ok!(h.controller.prepare().await);
        let stalled = tokio::time::timeout(Duration::from_millis(50), h.controller.deploy()).await;
        assert!(stalled.is_err());
        assert_eq!(h.controller.state(), PipelineState::Deploying);

        let halt = assert_err!(h.controller.deploy().await);
        assert_eq!(halt, Halt::Failed(DeployError::DeploymentInFlight));
        assert_eq!(h.controller.state(), PipelineState::Deploying);
    }

    /// Wallet whose chain follows `switch_chain`. Both a switch and a
    /// submission emit `chainChanged`, the latter for `echo`.
    struct ChainEchoWallet {
        inner: MockWalletProvider,
        chain: AtomicU64,
        echo: ChainId,
        events: broadcast::Sender<ProviderEvent>,
        sends: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl WalletProvider for ChainEchoWallet {
        async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
            self.inner.request_accounts().await
        }

        async fn chain_id(&self) -> Result<u64, ProviderError> {
            Ok(self.chain.load(Ordering::SeqCst))
        }

        async fn switch_chain(&self, chain_id_hex: &str) -> Result<(), ProviderError> {
            self.inner.switch_chain(chain_id_hex).await?;
            let chain_id = u64::from_str_radix(chain_id_hex.trim_start_matches("0x"), 16)
                .map_err(|e| ProviderError::Transport(e.to_string()))?;
            self.chain.store(chain_id, Ordering::SeqCst);
            let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
            Ok(())
        }

        async fn gas_price(&self) -> Result<U256, ProviderError> {
            self.inner.gas_price().await
        }

        async fn estimate_gas(&self, call_data: &Bytes, from: Address) -> Result<U256, ProviderError> {
            self.inner.estimate_gas(call_data, from).await
        }

        async fn send_transaction(&self, request: DeploymentRequest) -> Result<DeploymentReceipt, ProviderError> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            let _ = self.events.send(ProviderEvent::ChainChanged(self.echo));
            tokio::task::yield_now().await;
            self.inner.send_transaction(request).await
        }

        fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
            self.events.subscribe()
        }
    }

    fn echo_harness(start: ChainId, echo: ChainId) -> (Harness, Arc<AtomicUsize>) {
        let (events, _) = broadcast::channel(16);
        let mut inner = MockWalletProvider::new();
        inner.expect_request_accounts().returning(|| Ok(vec![account()]));
        inner
            .expect_switch_chain()
            .with(mockall::predicate::eq("0x61"))
            .returning(|_| Ok(()));
        inner.expect_gas_price().returning(|| Ok(U256::from(GAS_PRICE)));
        inner.expect_estimate_gas().returning(|_, _| Ok(U256::from(GAS_ESTIMATE)));
        inner.expect_send_transaction().returning(|_| Ok(receipt()));

        let sends = Arc::new(AtomicUsize::new(0));
        let provider: Arc<dyn WalletProvider> = Arc::new(ChainEchoWallet {
            inner,
            chain: AtomicU64::new(start),
            echo,
            events: events.clone(),
            sends: sends.clone(),
        });
        (harness_with(Some(provider), Some(params()), events), sends)
    }

    #[tokio::test]
    async fn test_switch_echo_during_deploy_submits_once() {
        let (mut h, sends) = echo_harness(56, 97);

        match h.controller.run(&AutoConfirm).await {
            FlowOutcome::Deployed(result) => assert_eq!(result.contract_address, Address::repeat_byte(0xcd)),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(h.controller.state(), PipelineState::Deployed);
        assert_eq!(h.controller.session().map(|s| s.chain_id), Some(97));
    }

    #[tokio::test]
    async fn test_chain_change_during_deploy_is_not_resubmitted() {
        let (mut h, sends) = echo_harness(97, 56);

        let outcome = h.controller.run(&AutoConfirm).await;

        assert_eq!(outcome, FlowOutcome::Signal(FlowSignal::Reload));
        assert_eq!(sends.load(Ordering::SeqCst), 1);
        assert_eq!(h.controller.session(), None);
        assert!(h
            .sink
            .last_status()
            .expect("No status shown")
            .starts_with("Network changed while the deployment was pending"));
    }

    #[tokio::test]
    async fn test_chain_change_to_current_chain_keeps_session() {
        let provider = connected_provider(97);
        let mut h = harness(Some(provider), Some(params()));

        assert_ok!(h.controller.initialize().await);
        assert_eq!(h.controller.handle_event(ProviderEvent::ChainChanged(97)), None);
        assert_eq!(h.controller.session(), Some(WalletSession::new(account(), 97)));
        assert_eq!(h.controller.state(), PipelineState::Connected);
    }
}
