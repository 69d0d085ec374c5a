use ethers::{abi::Token, types::Address};

use crate::{
    chain::ChainClient,
    contracts::ContractKind,
    error::{Error, Result},
    network::NetworkContext,
    registry::DeploymentRegistry,
    verify::SourceVerifier,
};

/// A contract instance created by this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployedContract {
    pub kind: ContractKind,
    pub address: Address,
    pub network: String,
}

/// Deploy a new FundMe reading prices from `price_feed`, signed by the chain handle's
/// account (which becomes the contract owner), and record it as the network's latest
/// FundMe.
///
/// When `verify` is set the source is submitted to `verifier` afterwards. Verification is
/// best-effort: its failure is logged and never fails the deployment.
pub async fn deploy_fund_me<C: ChainClient + ?Sized>(
    chain: &C,
    registry: &dyn DeploymentRegistry,
    network: &NetworkContext,
    price_feed: Address,
    verify: bool,
    verifier: Option<&dyn SourceVerifier>,
) -> Result<DeployedContract> {
    tracing::info!(
        "Deploying FundMe on {network} from {:?} with price feed {price_feed:?}",
        chain.account()
    );
    let address = chain
        .deploy_fund_me(price_feed)
        .await
        .map_err(|source| Error::DeploymentFailure {
            contract: ContractKind::FundMe,
            source,
        })?;

    let deployed = DeployedContract {
        kind: ContractKind::FundMe,
        address,
        network: network.id().to_owned(),
    };
    registry.record(network.id(), ContractKind::FundMe, address)?;
    tracing::info!("Contract deployed to {address:?}");

    if verify {
        publish_source(&deployed, price_feed, verifier).await;
    }

    Ok(deployed)
}

async fn publish_source(
    deployed: &DeployedContract,
    price_feed: Address,
    verifier: Option<&dyn SourceVerifier>,
) {
    let Some(verifier) = verifier else {
        tracing::warn!(
            "Source verification requested for {:?} but no verifier is configured",
            deployed.address
        );
        return;
    };

    match verifier
        .verify(deployed, &[Token::Address(price_feed)])
        .await
    {
        Ok(guid) => tracing::info!(
            "Submitted {} at {:?} for verification ({guid})",
            deployed.kind,
            deployed.address
        ),
        Err(e) => tracing::warn!(
            "Source verification of {} at {:?} failed: {e}",
            deployed.kind,
            deployed.address
        ),
    }
}
