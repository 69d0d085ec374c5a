use std::sync::Arc;

use ethers::{
    providers::Middleware,
    types::{Address, Bytes, I256},
};

use super::deploy_contract;
use crate::chain::ChainError;

// Include generated contract types from build script
include!(concat!(env!("OUT_DIR"), "/mock_v3_aggregator_contract.rs"));

/// Chainlink-style price feed stand-in for networks without a live oracle.
pub struct MockV3AggregatorContract;

impl MockV3AggregatorContract {
    pub async fn deploy<T: Middleware + 'static>(
        signer: Arc<T>,
        bytecode: Bytes,
        decimals: u8,
        initial_answer: I256,
        confirmations: usize,
    ) -> Result<Address, ChainError> {
        deploy_contract(
            signer,
            MOCKV3AGGREGATOR_ABI.clone(),
            bytecode,
            (decimals, initial_answer),
            confirmations,
        )
        .await
    }
}
