use ethers::types::{Address, TransactionReceipt};

use crate::{
    chain::ChainClient,
    contracts::ContractKind,
    error::{Error, Result},
    network::NetworkContext,
    registry::DeploymentRegistry,
};

/// Drives `fund` and `withdraw` against the latest FundMe of a network.
///
/// Operations are independent: any number of each, in any order. No client-side
/// authorization is done; the contract decides and its revert reason is surfaced as
/// [`Error::ContractRevert`].
pub struct InteractionDriver<'a, C: ?Sized> {
    chain: &'a C,
    registry: &'a dyn DeploymentRegistry,
    network: &'a NetworkContext,
}

impl<'a, C> InteractionDriver<'a, C>
where
    C: ChainClient + ?Sized,
{
    pub fn new(
        chain: &'a C,
        registry: &'a dyn DeploymentRegistry,
        network: &'a NetworkContext,
    ) -> Self {
        Self {
            chain,
            registry,
            network,
        }
    }

    /// The most recently deployed FundMe on the active network.
    pub fn latest_fund_me(&self) -> Result<Address> {
        self.registry
            .latest(self.network.id(), ContractKind::FundMe)?
            .ok_or_else(|| Error::NoDeploymentFound {
                contract: ContractKind::FundMe,
                network: self.network.id().to_owned(),
            })
    }

    /// Fund the latest FundMe with exactly its current entrance fee.
    ///
    /// The fee is read right before sending since it moves with the oracle price.
    pub async fn fund(&self) -> Result<TransactionReceipt> {
        let fund_me = self.latest_fund_me()?;

        let entrance_fee = self
            .chain
            .entrance_fee(fund_me)
            .await
            .map_err(|e| Error::interaction("getEntranceFee", ContractKind::FundMe, fund_me, e))?;
        tracing::info!("Current entry fee is {entrance_fee}");

        tracing::info!("Funding contract...");
        let receipt = self
            .chain
            .fund(fund_me, entrance_fee)
            .await
            .map_err(|e| Error::interaction("fund", ContractKind::FundMe, fund_me, e))?;
        tracing::info!(
            "Funded {fund_me:?} with {entrance_fee} wei from {:?} (tx {:?})",
            self.chain.account(),
            receipt.transaction_hash
        );
        Ok(receipt)
    }

    /// Withdraw everything funded to the latest FundMe. Only succeeds for its owner.
    pub async fn withdraw(&self) -> Result<TransactionReceipt> {
        let fund_me = self.latest_fund_me()?;

        tracing::info!("Withdrawing from contract...");
        let receipt = self
            .chain
            .withdraw(fund_me)
            .await
            .map_err(|e| {
                Error::interaction("withdrawAmountFunded", ContractKind::FundMe, fund_me, e)
            })?;
        tracing::info!(
            "Withdrew from {fund_me:?} to {:?} (tx {:?})",
            self.chain.account(),
            receipt.transaction_hash
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::{I256, U256};

    use super::InteractionDriver;
    use crate::{
        chain::{
            test_utils::{test_account, FakeChain, ONLY_OWNER},
            ChainClient,
        },
        config::OrchestratorConfig,
        contracts::ContractKind,
        error::Error,
        registry::{DeploymentRegistry, InMemoryDeploymentRegistry},
    };

    #[tokio::test]
    async fn test_fund_without_deployment_fails() {
        let chain = FakeChain::new();
        let client = chain.connect(test_account(0));
        let registry = InMemoryDeploymentRegistry::new();
        let network = OrchestratorConfig::local().network_context("development");
        let driver = InteractionDriver::new(&client, &registry, &network);

        let err = driver.fund().await.unwrap_err();
        assert!(matches!(
            err,
            Error::NoDeploymentFound {
                contract: ContractKind::FundMe,
                ref network,
            } if network == "development"
        ));
        assert!(matches!(
            driver.withdraw().await.unwrap_err(),
            Error::NoDeploymentFound { .. }
        ));
        assert!(chain.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fund_reads_fee_fresh_each_time() {
        let chain = FakeChain::new();
        let owner = chain.connect(test_account(0));
        let registry = InMemoryDeploymentRegistry::new();
        let network = OrchestratorConfig::local().network_context("development");

        let mock = owner
            .deploy_mock_price_feed(8, I256::from(200_000_000_000i64))
            .await
            .unwrap();
        let fund_me = owner.deploy_fund_me(mock).await.unwrap();
        registry
            .record("development", ContractKind::FundMe, fund_me)
            .unwrap();

        let driver = InteractionDriver::new(&owner, &registry, &network);
        driver.fund().await.unwrap();
        // ETH doubles in price: half the wei for the same 50 USD
        chain.set_answer(mock, I256::from(400_000_000_000i64));
        driver.fund().await.unwrap();

        let sent = chain.sent();
        assert_eq!(sent.len(), 2);
        // 50 USD at 2000 USD/ETH and at 4000 USD/ETH, plus one wei
        assert_eq!(sent[0].value, U256::from(25_000_000_000_000_001u64));
        assert_eq!(sent[1].value, U256::from(12_500_000_000_000_001u64));
        assert!(sent.iter().all(|tx| tx.method == "fund" && tx.to == fund_me));
    }

    #[tokio::test]
    async fn test_withdraw_by_non_owner_surfaces_revert() {
        let chain = FakeChain::new();
        let owner = chain.connect(test_account(0));
        let stranger = chain.connect(test_account(1));
        let registry = InMemoryDeploymentRegistry::new();
        let network = OrchestratorConfig::local().network_context("development");

        let mock = owner
            .deploy_mock_price_feed(8, I256::from(200_000_000_000i64))
            .await
            .unwrap();
        let fund_me = owner.deploy_fund_me(mock).await.unwrap();
        registry
            .record("development", ContractKind::FundMe, fund_me)
            .unwrap();

        let err = InteractionDriver::new(&stranger, &registry, &network)
            .withdraw()
            .await
            .unwrap_err();

        match err {
            Error::ContractRevert {
                contract,
                address,
                reason,
            } => {
                assert_eq!(contract, ContractKind::FundMe);
                assert_eq!(address, fund_me);
                assert_eq!(reason, ONLY_OWNER);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(chain.sent().is_empty());
        assert_eq!(
            registry.latest("development", ContractKind::FundMe).unwrap(),
            Some(fund_me)
        );

        InteractionDriver::new(&owner, &registry, &network)
            .withdraw()
            .await
            .unwrap();
        assert_eq!(chain.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_driver_uses_latest_deployment() {
        let chain = FakeChain::new();
        let owner = chain.connect(test_account(0));
        let registry = InMemoryDeploymentRegistry::new();
        let network = OrchestratorConfig::local().network_context("development");

        let mock = owner
            .deploy_mock_price_feed(8, I256::from(200_000_000_000i64))
            .await
            .unwrap();
        for _ in 0..2 {
            let fund_me = owner.deploy_fund_me(mock).await.unwrap();
            registry
                .record("development", ContractKind::FundMe, fund_me)
                .unwrap();
        }
        let latest = chain.deployments_of(ContractKind::FundMe)[1];

        let driver = InteractionDriver::new(&owner, &registry, &network);
        assert_eq!(driver.latest_fund_me().unwrap(), latest);
        driver.fund().await.unwrap();

        assert_eq!(chain.sent()[0].to, latest);
        assert!(chain.fund_me(latest).unwrap().balance > U256::zero());
    }
}
