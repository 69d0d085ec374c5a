use std::path::PathBuf;

use async_trait::async_trait;
use ethers::{
    abi::Token,
    etherscan::{verify::VerifyContract, Client},
    types::Chain,
};

use crate::{config::VerificationConfig, contracts::ContractKind, deployer::DeployedContract};

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("block explorer rejected the verification request: {0}")]
    Etherscan(String),

    #[error("failed to read contract source {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chain id {0} has no known block explorer")]
    UnsupportedChain(u64),
}

/// Publishes a deployed contract's source to a block explorer.
#[async_trait]
pub trait SourceVerifier: Send + Sync {
    /// Submit `contract` for verification. Returns the explorer's request id.
    async fn verify(
        &self,
        contract: &DeployedContract,
        constructor_args: &[Token],
    ) -> Result<String, VerifyError>;
}

/// Hex encoded constructor arguments, as the Etherscan API expects them (no `0x`).
pub fn encode_constructor_args(args: &[Token]) -> String {
    hex::encode(ethers::abi::encode(args))
}

/// [`SourceVerifier`] for Etherscan and Etherscan-compatible explorers.
///
/// Contracts are submitted as single-file sources read from
/// [`VerificationConfig::sources_dir`].
pub struct EtherscanVerifier {
    client: Client,
    config: VerificationConfig,
}

impl EtherscanVerifier {
    pub fn new(
        chain_id: u64,
        api_key: impl Into<String>,
        config: VerificationConfig,
    ) -> Result<Self, VerifyError> {
        let chain =
            Chain::try_from(chain_id).map_err(|_| VerifyError::UnsupportedChain(chain_id))?;
        let client =
            Client::new(chain, api_key).map_err(|e| VerifyError::Etherscan(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn source_path(&self, kind: ContractKind) -> PathBuf {
        match kind {
            ContractKind::FundMe => self.config.sources_dir.join("FundMe.sol"),
            ContractKind::MockV3Aggregator => self
                .config
                .sources_dir
                .join("test")
                .join("MockV3Aggregator.sol"),
        }
    }
}

#[async_trait]
impl SourceVerifier for EtherscanVerifier {
    async fn verify(
        &self,
        contract: &DeployedContract,
        constructor_args: &[Token],
    ) -> Result<String, VerifyError> {
        let path = self.source_path(contract.kind);
        let source = std::fs::read_to_string(&path)
            .map_err(|source| VerifyError::Source { path, source })?;

        let mut request = VerifyContract::new(
            contract.address,
            contract.kind.name().to_owned(),
            source,
            self.config.compiler_version.clone(),
        )
        .constructor_arguments(Some(encode_constructor_args(constructor_args)));
        if let Some(runs) = self.config.optimization_runs {
            request = request.optimization(true).runs(runs);
        }

        let response = self
            .client
            .submit_contract_verification(&request)
            .await
            .map_err(|e| VerifyError::Etherscan(e.to_string()))?;

        // status "1" means the request was queued
        if response.status != "1" {
            return Err(VerifyError::Etherscan(format!(
                "{}: {}",
                response.message, response.result
            )));
        }
        Ok(response.result)
    }
}
