use ethers::types::Address;

use crate::{chain::ChainError, contracts::ContractKind, registry::RegistryError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration cannot support the requested operation, e.g. a persistent
    /// network without a price feed address.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A deployment transaction was rejected, dropped, or could not be sent.
    /// Nothing was recorded for it.
    #[error("failed to deploy {contract}: {source}")]
    DeploymentFailure {
        contract: ContractKind,
        #[source]
        source: ChainError,
    },

    #[error("no {contract} deployment found on network `{network}`, deploy it first")]
    NoDeploymentFound {
        contract: ContractKind,
        network: String,
    },

    /// The contract rejected the call. `reason` is passed through untouched.
    #[error("{contract} at {address:?} reverted: {reason}")]
    ContractRevert {
        contract: ContractKind,
        address: Address,
        reason: String,
    },

    #[error("{step} on {address:?} failed: {source}")]
    Chain {
        step: &'static str,
        address: Address,
        #[source]
        source: ChainError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl Error {
    /// Classify a chain failure that happened while interacting with a deployed contract.
    pub(crate) fn interaction(
        step: &'static str,
        contract: ContractKind,
        address: Address,
        source: ChainError,
    ) -> Self {
        match source {
            ChainError::Reverted { reason } => Error::ContractRevert {
                contract,
                address,
                reason,
            },
            source => Error::Chain {
                step,
                address,
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
