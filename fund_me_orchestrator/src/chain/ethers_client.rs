use std::sync::Arc;

use async_trait::async_trait;
use ethers::{
    providers::Middleware,
    types::{Address, TransactionReceipt, I256, U256},
};

use super::{ChainClient, ChainError};
use crate::contracts::{
    fund_me::FundMeContract, mock_v3_aggregator::MockV3AggregatorContract, ArtifactStore,
    ContractKind,
};

/// [`ChainClient`] over any ethers [`Middleware`] (normally a `SignerMiddleware`, so that
/// transactions are signed locally by the resolved account).
pub struct EthersChainClient<M> {
    client: Arc<M>,
    account: Address,
    artifacts: ArtifactStore,
    confirmations: usize,
}

impl<M> EthersChainClient<M>
where
    M: Middleware + 'static,
{
    pub fn new(client: Arc<M>, account: Address, artifacts: ArtifactStore) -> Self {
        Self {
            client,
            account,
            artifacts,
            confirmations: 1,
        }
    }

    /// Number of blocks to wait for on every transaction before treating it as final.
    pub fn with_confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations;
        self
    }
}

#[async_trait]
impl<M> ChainClient for EthersChainClient<M>
where
    M: Middleware + 'static,
{
    fn account(&self) -> Address {
        self.account
    }

    async fn deploy_mock_price_feed(
        &self,
        decimals: u8,
        initial_answer: I256,
    ) -> Result<Address, ChainError> {
        let bytecode = self.artifacts.bytecode(ContractKind::MockV3Aggregator)?;
        MockV3AggregatorContract::deploy(
            self.client.clone(),
            bytecode,
            decimals,
            initial_answer,
            self.confirmations,
        )
        .await
    }

    async fn deploy_fund_me(&self, price_feed: Address) -> Result<Address, ChainError> {
        let bytecode = self.artifacts.bytecode(ContractKind::FundMe)?;
        FundMeContract::deploy(
            self.client.clone(),
            bytecode,
            price_feed,
            self.confirmations,
        )
        .await
    }

    async fn entrance_fee(&self, fund_me: Address) -> Result<U256, ChainError> {
        FundMeContract::at(fund_me)
            .entrance_fee(self.client.clone())
            .await
    }

    async fn fund(&self, fund_me: Address, value: U256) -> Result<TransactionReceipt, ChainError> {
        FundMeContract::at(fund_me)
            .fund(self.client.clone(), value, self.confirmations)
            .await
    }

    async fn withdraw(&self, fund_me: Address) -> Result<TransactionReceipt, ChainError> {
        FundMeContract::at(fund_me)
            .withdraw(self.client.clone(), self.confirmations)
            .await
    }
}
