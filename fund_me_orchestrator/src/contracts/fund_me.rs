use std::sync::Arc;

use ethers::{
    providers::Middleware,
    types::{Address, Bytes, TransactionReceipt, U256},
};

use super::{contract_error, deploy_contract, send_and_confirm};
use crate::chain::ChainError;

// Include generated contract types from build script
include!(concat!(env!("OUT_DIR"), "/fund_me_contract.rs"));

/// A deployed `FundMe` contract.
pub struct FundMeContract {
    contract_address: Address,
}

impl FundMeContract {
    pub fn at(contract_address: Address) -> Self {
        Self { contract_address }
    }

    fn contract_with_client<T: Middleware>(&self, client: Arc<T>) -> FundMe<T> {
        FundMe::new(self.contract_address, client)
    }

    /// Deploy a new `FundMe` reading its prices from `price_feed`. The deploying account
    /// becomes the contract owner.
    pub async fn deploy<T: Middleware + 'static>(
        signer: Arc<T>,
        bytecode: Bytes,
        price_feed: Address,
        confirmations: usize,
    ) -> Result<Address, ChainError> {
        deploy_contract(
            signer,
            FUNDME_ABI.clone(),
            bytecode,
            price_feed,
            confirmations,
        )
        .await
    }

    pub async fn entrance_fee<T: Middleware + 'static>(
        &self,
        client: Arc<T>,
    ) -> Result<U256, ChainError> {
        self.contract_with_client(client)
            .get_entrance_fee()
            .call()
            .await
            .map_err(contract_error)
    }

    pub async fn fund<T: Middleware + 'static>(
        &self,
        signer: Arc<T>,
        value: U256,
        confirmations: usize,
    ) -> Result<TransactionReceipt, ChainError> {
        let call = self.contract_with_client(signer).fund().value(value);
        send_and_confirm(call, confirmations).await
    }

    pub async fn withdraw<T: Middleware + 'static>(
        &self,
        signer: Arc<T>,
        confirmations: usize,
    ) -> Result<TransactionReceipt, ChainError> {
        let call = self.contract_with_client(signer).withdraw_amount_funded();
        send_and_confirm(call, confirmations).await
    }
}
