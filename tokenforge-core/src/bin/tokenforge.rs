use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokenforge_core::shared::utils::logo_data_url;
use tokenforge_core::{
    build_controller, AutoConfirm, ConsoleStatusSink, DeployConfirmation, DeployerConfig, EventWatcher, FeeQuote,
    FileParameterStore, FlowOutcome, FlowSignal, ParameterStore, RpcWalletProvider, TokenParameters, WalletProvider,
    REQUIRED_NETWORK,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Create and deploy a token contract through a connected wallet
#[derive(Parser, Debug)]
#[command(name = "tokenforge")]
#[command(about = "TokenForge - deploy a token contract through your wallet")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate token parameters, connect the wallet and save them
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        /// Initial supply as a positive integer
        #[arg(long)]
        supply: String,
        /// Image file embedded as a data URL
        #[arg(long)]
        logo: Option<PathBuf>,
        #[arg(long, default_value = "bsc-testnet")]
        network: String,
    },

    /// Run the deployment flow for the saved parameters
    Deploy {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Forget the saved parameters
    Clear,

    /// Show current configuration
    ShowConfig,
}

/// Asks on stdin before deploying
struct PromptConfirmation;

#[async_trait]
impl DeployConfirmation for PromptConfirmation {
    async fn confirm(&self, params: &TokenParameters, quote: Option<&FeeQuote>) -> bool {
        let fee = quote
            .and_then(|quote| quote.display(REQUIRED_NETWORK).ok())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "Deploy {} ({}) with supply {} on {} for an estimated {}? [y/N]",
            params.name, params.symbol, params.supply, REQUIRED_NETWORK.name, fee
        );

        let mut answer = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut answer).await {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                log::warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

fn wallet(config: &DeployerConfig) -> Result<Arc<RpcWalletProvider>> {
    let provider = RpcWalletProvider::connect(&config.rpc_url)?.with_confirmations(config.confirmations);
    Ok(Arc::new(provider))
}

async fn create(
    config: &DeployerConfig,
    name: String,
    symbol: String,
    supply: String,
    logo: Option<PathBuf>,
    network: String,
) -> Result<()> {
    let logo = match logo {
        Some(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read logo {}", path.display()))?;
            let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            logo_data_url(&file_name, &bytes)
        }
        None => String::new(),
    };
    let params = TokenParameters::new(name, symbol, supply, logo, network)?;

    let provider: Arc<dyn WalletProvider> = wallet(config)?;
    let mut controller = build_controller(config, Some(provider), Arc::new(ConsoleStatusSink));
    let session = controller.submit_parameters(params).await?;
    println!("Saved with account {:?}. Run `tokenforge deploy` next.", session.account);
    Ok(())
}

async fn deploy(config: &DeployerConfig, yes: bool) -> Result<()> {
    let problems = config.validate();
    if !problems.is_empty() {
        bail!("Invalid configuration: {}", problems.join("; "));
    }

    let provider = wallet(config)?;
    let watcher = EventWatcher::spawn(provider.clone(), config.event_poll_interval());
    let mut controller = build_controller(config, Some(provider as Arc<dyn WalletProvider>), Arc::new(ConsoleStatusSink));

    let outcome = if yes {
        controller.run(&AutoConfirm).await
    } else {
        controller.run(&PromptConfirmation).await
    };
    controller.teardown();
    watcher.abort();

    match outcome {
        FlowOutcome::Deployed(result) => {
            println!("Token contract: {}", result.address_string());
            if let Some(hash) = result.transaction_hash {
                println!("Transaction: {:?}", hash);
            }
            Ok(())
        }
        FlowOutcome::Declined => Ok(()),
        FlowOutcome::Signal(FlowSignal::RedirectToEntry) => {
            bail!("Nothing to deploy yet. Connect your wallet and run `tokenforge create` first.")
        }
        FlowOutcome::Signal(FlowSignal::Reload) => {
            bail!("Wallet network changed while the deployment was pending. Check the transaction before deploying again.")
        }
        FlowOutcome::Failed(e) => Err(e.into()),
    }
}

fn show_config(config: &DeployerConfig) {
    let network = config.required_network();
    println!("TokenForge Configuration:\n");
    println!("  RPC URL: {}", config.rpc_url);
    println!("  Artifact source: {}", config.artifact_source);
    println!("  ABI document: {}", config.abi_document);
    println!("  Bytecode document: {}", config.bytecode_document);
    println!("  Data directory: {}", config.data_dir.display());
    println!("  Confirmations: {}", config.confirmations);
    println!("  Event poll interval: {} ms", config.event_poll_interval_ms);
    println!("  Required network: {} (chain id {})", network.name, network.chain_id);

    let problems = config.validate();
    if !problems.is_empty() {
        println!("\nProblems:");
        for problem in problems {
            println!("  - {}", problem);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tokenforge_core::init();
    let cli = Cli::parse();
    let config = DeployerConfig::from_env()?;

    match cli.command {
        Commands::Create { name, symbol, supply, logo, network } => {
            create(&config, name, symbol, supply, logo, network).await
        }
        Commands::Deploy { yes } => deploy(&config, yes).await,
        Commands::Clear => {
            FileParameterStore::new(config.data_dir.clone()).clear()?;
            println!("Saved token parameters cleared");
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}
