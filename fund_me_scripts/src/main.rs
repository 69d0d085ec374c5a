mod cli;
mod ethers_client;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ethers::signers::Signer;
use fund_me_orchestrator::{
    chain::{ethers_client::EthersChainClient, ChainClient},
    config::{NetworkConfig, OrchestratorConfig},
    contracts::ArtifactStore,
    registry::JsonFileDeploymentRegistry,
    verify::{EtherscanVerifier, SourceVerifier},
    Orchestrator,
};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Cli, Command},
    ethers_client::{get_account, get_writer_ethers_client},
};

const ETHERSCAN_TOKEN_ENV_VAR: &str = "ETHERSCAN_TOKEN";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(OrchestratorConfig::load());
    let network_id = cli
        .network
        .unwrap_or_else(|| config.default_network.clone());
    let network = config.network_context(&network_id);
    let network_config = config.network(&network_id)?;

    let wallet = get_account(&network, cli.account_index)?;
    let account = wallet.address();
    tracing::info!("Using account {account:?} on {network}");

    let signer = get_writer_ethers_client(wallet, network_config)?;
    let chain = EthersChainClient::new(
        signer,
        account,
        ArtifactStore::new(&config.artifacts_dir),
    )
    .with_confirmations(config.confirmations);

    let registry = JsonFileDeploymentRegistry::open(&config.deployments_file)
        .context("failed to open deployment registry")?;

    let mut orchestrator =
        Orchestrator::new(Arc::new(chain), config.clone(), &network_id, Arc::new(registry));
    if config.verify_source(&network_id) {
        if let Some(verifier) = etherscan_verifier(&config, network_config) {
            orchestrator = orchestrator.with_verifier(verifier);
        }
    }

    match cli.command {
        Command::Deploy => deploy(&orchestrator).await,
        Command::Fund => fund(&orchestrator).await,
        Command::Withdraw => withdraw(&orchestrator).await,
        Command::FundAndWithdraw => {
            fund(&orchestrator).await?;
            withdraw(&orchestrator).await
        }
    }
}

async fn deploy<C: ChainClient>(orchestrator: &Orchestrator<C>) -> anyhow::Result<()> {
    let deployed = orchestrator.deploy().await?;
    println!("Contract deployed to {:?}", deployed.address);
    Ok(())
}

async fn fund<C: ChainClient>(orchestrator: &Orchestrator<C>) -> anyhow::Result<()> {
    let receipt = orchestrator.fund().await?;
    println!("Funded in tx {:?}", receipt.transaction_hash);
    Ok(())
}

async fn withdraw<C: ChainClient>(orchestrator: &Orchestrator<C>) -> anyhow::Result<()> {
    let receipt = orchestrator.withdraw().await?;
    println!("Withdrew in tx {:?}", receipt.transaction_hash);
    Ok(())
}

fn etherscan_verifier(
    config: &OrchestratorConfig,
    network_config: &NetworkConfig,
) -> Option<Arc<dyn SourceVerifier>> {
    let Ok(api_key) = std::env::var(ETHERSCAN_TOKEN_ENV_VAR) else {
        tracing::warn!("{ETHERSCAN_TOKEN_ENV_VAR} is not set, skipping source verification");
        return None;
    };

    match EtherscanVerifier::new(
        network_config.chain_id,
        api_key,
        config.verification.clone(),
    ) {
        Ok(verifier) => Some(Arc::new(verifier)),
        Err(e) => {
            tracing::warn!("Source verification unavailable: {e}");
            None
        }
    }
}
