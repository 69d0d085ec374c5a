use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    network::{NetworkContext, DEFAULT_LOCAL_NETWORKS},
};

pub const CONFIG_PATH_ENV_VAR: &str = "FUND_ME_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "fund_me.toml";

const DEFAULT_NETWORK: &str = "development";
const DEFAULT_RPC_URL: &str = "http://localhost:8545";
const DEFAULT_CHAIN_ID: u64 = 31337;
const DEFAULT_DEPLOYMENTS_FILE: &str = "deployments/map.json";
const DEFAULT_ARTIFACTS_DIR: &str = "smart-contracts/artifacts";
const DEFAULT_SOURCES_DIR: &str = "smart-contracts/contracts";
const DEFAULT_COMPILER_VERSION: &str = "v0.8.19+commit.7dd6d404";

/// Per-network settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Live ETH/USD price feed. Required on persistent networks.
    #[serde(default)]
    pub eth_usd_price_feed: Option<Address>,
    /// Publish the FundMe source to the chain's block explorer after deploying.
    #[serde(default)]
    pub verify: Option<bool>,
}

/// Settings for block explorer source verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    #[serde(default = "default_sources_dir")]
    pub sources_dir: PathBuf,
    #[serde(default = "default_compiler_version")]
    pub compiler_version: String,
    /// `None` means the sources were compiled without the optimizer.
    #[serde(default)]
    pub optimization_runs: Option<u32>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            sources_dir: default_sources_dir(),
            compiler_version: default_compiler_version(),
            optimization_runs: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Network used when none is selected explicitly.
    #[serde(default = "default_network")]
    pub default_network: String,
    /// Ids of local/ephemeral networks. Replaces the built-in list when set.
    #[serde(default = "default_local_networks")]
    pub local_networks: Vec<String>,
    #[serde(default = "default_deployments_file")]
    pub deployments_file: PathBuf,
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_owned()
}

fn default_local_networks() -> Vec<String> {
    DEFAULT_LOCAL_NETWORKS
        .iter()
        .map(|id| id.to_string())
        .collect()
}

fn default_deployments_file() -> PathBuf {
    PathBuf::from(DEFAULT_DEPLOYMENTS_FILE)
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_DIR)
}

fn default_sources_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCES_DIR)
}

fn default_compiler_version() -> String {
    DEFAULT_COMPILER_VERSION.to_owned()
}

fn default_confirmations() -> usize {
    1
}

impl OrchestratorConfig {
    /// load from `$FUND_ME_CONFIG` (or `fund_me.toml`), else local
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_PATH_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        match Self::from_file(&path) {
            Ok(c) => {
                tracing::info!("Loaded config from {}", path.display());
                c
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {e}", path.display());
                tracing::info!("Loading local config");
                Self::local()
            }
        }
    }

    /// A single local `development` network on the default anvil/hardhat port.
    pub fn local() -> Self {
        Self {
            default_network: default_network(),
            local_networks: default_local_networks(),
            deployments_file: default_deployments_file(),
            artifacts_dir: default_artifacts_dir(),
            confirmations: default_confirmations(),
            verification: VerificationConfig::default(),
            networks: BTreeMap::from([(
                DEFAULT_NETWORK.to_owned(),
                NetworkConfig {
                    rpc_url: DEFAULT_RPC_URL.to_owned(),
                    chain_id: DEFAULT_CHAIN_ID,
                    eth_usd_price_feed: None,
                    verify: Some(false),
                },
            )]),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Configuration(e.to_string()))
    }

    pub fn network_context(&self, network_id: &str) -> NetworkContext {
        NetworkContext::new(network_id, &self.local_networks)
    }

    pub fn network(&self, network_id: &str) -> Result<&NetworkConfig> {
        self.networks.get(network_id).ok_or_else(|| {
            Error::Configuration(format!("network `{network_id}` is not configured"))
        })
    }

    /// The configured ETH/USD price feed of `network_id`.
    pub fn price_feed(&self, network_id: &str) -> Result<Address> {
        self.network(network_id)?.eth_usd_price_feed.ok_or_else(|| {
            Error::Configuration(format!(
                "no eth_usd_price_feed configured for network `{network_id}`"
            ))
        })
    }

    /// Whether deployments on `network_id` should be source-verified. Unconfigured
    /// networks are never verified.
    pub fn verify_source(&self, network_id: &str) -> bool {
        self.networks
            .get(network_id)
            .and_then(|n| n.verify)
            .unwrap_or(false)
    }
}
