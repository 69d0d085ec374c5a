use ethers::types::{Address, I256};
use tokio::sync::Mutex;

use crate::{
    chain::ChainClient,
    config::OrchestratorConfig,
    contracts::ContractKind,
    error::{Error, Result},
    network::{NetworkContext, NetworkKind},
    registry::DeploymentRegistry,
};

/// Decimals of the mock feed's answer, the same precision as Chainlink's ETH/USD feeds.
/// `FundMe.getPrice` scales answers by 1e10 assuming exactly this.
pub const DECIMALS: u8 = 8;
/// 2000 USD per ETH.
pub const INITIAL_ANSWER: i64 = 200_000_000_000;

/// Deploys the mock price feed for local networks, at most once per instance.
///
/// Share one provisioner for the whole process so every FundMe deployed in the session
/// reads the same mock.
pub struct MockOracleProvisioner {
    decimals: u8,
    initial_answer: I256,
    deployed: Mutex<Option<Address>>,
}

impl Default for MockOracleProvisioner {
    fn default() -> Self {
        Self::new(DECIMALS, I256::from(INITIAL_ANSWER))
    }
}

impl MockOracleProvisioner {
    pub fn new(decimals: u8, initial_answer: I256) -> Self {
        Self {
            decimals,
            initial_answer,
            deployed: Mutex::new(None),
        }
    }

    /// The mock deployed by this provisioner, if any.
    pub async fn deployed(&self) -> Option<Address> {
        *self.deployed.lock().await
    }

    /// Return the session's mock feed, deploying it first if needed.
    ///
    /// The lock is held across the deployment, so concurrent callers wait for the first
    /// deployment instead of sending their own. A failed deployment caches nothing.
    pub async fn ensure<C: ChainClient + ?Sized>(
        &self,
        chain: &C,
        registry: &dyn DeploymentRegistry,
        network: &NetworkContext,
    ) -> Result<Address> {
        let mut deployed = self.deployed.lock().await;
        if let Some(address) = *deployed {
            tracing::debug!("Reusing mock price feed at {address:?}");
            return Ok(address);
        }

        tracing::info!("Deploying mocks...");
        let address = chain
            .deploy_mock_price_feed(self.decimals, self.initial_answer)
            .await
            .map_err(|source| Error::DeploymentFailure {
                contract: ContractKind::MockV3Aggregator,
                source,
            })?;
        *deployed = Some(address);
        tracing::info!("Mocks deployed at {address:?}");

        registry.record(network.id(), ContractKind::MockV3Aggregator, address)?;
        Ok(address)
    }
}

/// The price feed a new FundMe on `network` must be wired to.
///
/// Persistent networks use the configured live feed and never send a transaction.
/// Local networks use the session's mock, deployed on first use.
pub async fn resolve_oracle<C: ChainClient + ?Sized>(
    network: &NetworkContext,
    config: &OrchestratorConfig,
    provisioner: &MockOracleProvisioner,
    chain: &C,
    registry: &dyn DeploymentRegistry,
) -> Result<Address> {
    match network.kind() {
        NetworkKind::Persistent => {
            let price_feed = config.price_feed(network.id())?;
            tracing::debug!("Using {network} price feed {price_feed:?}");
            Ok(price_feed)
        }
        NetworkKind::Local => provisioner.ensure(chain, registry, network).await,
    }
}
