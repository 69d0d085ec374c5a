use std::sync::Arc;

use ethers::types::TransactionReceipt;

use crate::{
    chain::ChainClient,
    config::OrchestratorConfig,
    deployer::{deploy_fund_me, DeployedContract},
    error::Result,
    interact::InteractionDriver,
    network::NetworkContext,
    oracle::{resolve_oracle, MockOracleProvisioner},
    registry::DeploymentRegistry,
    verify::SourceVerifier,
};

/// Everything one invocation needs on one network: the signing chain handle, the
/// configuration, the deployment registry and the session's mock provisioner.
pub struct Orchestrator<C> {
    chain: Arc<C>,
    config: Arc<OrchestratorConfig>,
    network: NetworkContext,
    registry: Arc<dyn DeploymentRegistry>,
    provisioner: Arc<MockOracleProvisioner>,
    verifier: Option<Arc<dyn SourceVerifier>>,
}

impl<C> Orchestrator<C>
where
    C: ChainClient,
{
    pub fn new(
        chain: Arc<C>,
        config: Arc<OrchestratorConfig>,
        network_id: &str,
        registry: Arc<dyn DeploymentRegistry>,
    ) -> Self {
        let network = config.network_context(network_id);
        Self {
            chain,
            config,
            network,
            registry,
            provisioner: Arc::new(MockOracleProvisioner::default()),
            verifier: None,
        }
    }

    /// Share a mock provisioner (and so the mock feed) with other orchestrators of the
    /// same process.
    pub fn with_provisioner(mut self, provisioner: Arc<MockOracleProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SourceVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn network(&self) -> &NetworkContext {
        &self.network
    }

    pub fn provisioner(&self) -> &Arc<MockOracleProvisioner> {
        &self.provisioner
    }

    /// Resolve the price feed for the active network, then deploy FundMe wired to it.
    pub async fn deploy(&self) -> Result<DeployedContract> {
        let price_feed = resolve_oracle(
            &self.network,
            &self.config,
            &self.provisioner,
            self.chain.as_ref(),
            self.registry.as_ref(),
        )
        .await?;

        deploy_fund_me(
            self.chain.as_ref(),
            self.registry.as_ref(),
            &self.network,
            price_feed,
            self.config.verify_source(self.network.id()),
            self.verifier.as_deref(),
        )
        .await
    }

    pub fn driver(&self) -> InteractionDriver<'_, C> {
        InteractionDriver::new(self.chain.as_ref(), self.registry.as_ref(), &self.network)
    }

    pub async fn fund(&self) -> Result<TransactionReceipt> {
        self.driver().fund().await
    }

    pub async fn withdraw(&self) -> Result<TransactionReceipt> {
        self.driver().withdraw().await
    }
}
