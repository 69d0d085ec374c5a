use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use ethers::types::Address;

use crate::contracts::ContractKind;

/// network id -> contract -> deployed addresses, oldest first.
pub type DeploymentMap = BTreeMap<String, BTreeMap<ContractKind, Vec<Address>>>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to access deployment map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("deployment map {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Bookkeeping of which contract instances were deployed on which network.
///
/// "The" instance of a contract on a network is always the most recently recorded one.
pub trait DeploymentRegistry: Send + Sync {
    fn latest(&self, network: &str, contract: ContractKind)
        -> Result<Option<Address>, RegistryError>;

    fn record(
        &self,
        network: &str,
        contract: ContractKind,
        address: Address,
    ) -> Result<(), RegistryError>;
}

fn latest_in(map: &DeploymentMap, network: &str, contract: ContractKind) -> Option<Address> {
    map.get(network)?.get(&contract)?.last().copied()
}

fn record_in(map: &mut DeploymentMap, network: &str, contract: ContractKind, address: Address) {
    map.entry(network.to_owned())
        .or_default()
        .entry(contract)
        .or_default()
        .push(address);
}

/// Registry that lives as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryDeploymentRegistry {
    map: Mutex<DeploymentMap>,
}

impl InMemoryDeploymentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, DeploymentMap> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeploymentRegistry for InMemoryDeploymentRegistry {
    fn latest(
        &self,
        network: &str,
        contract: ContractKind,
    ) -> Result<Option<Address>, RegistryError> {
        Ok(latest_in(&self.map(), network, contract))
    }

    fn record(
        &self,
        network: &str,
        contract: ContractKind,
        address: Address,
    ) -> Result<(), RegistryError> {
        record_in(&mut self.map(), network, contract, address);
        Ok(())
    }
}

/// Registry persisted as a JSON deployment map, so that `deploy`, `fund` and `withdraw`
/// run as separate processes agree on the latest instance.
#[derive(Debug)]
pub struct JsonFileDeploymentRegistry {
    path: PathBuf,
    map: Mutex<DeploymentMap>,
}

impl JsonFileDeploymentRegistry {
    /// Open the map at `path`. A missing file is an empty registry; it is created on the
    /// first [`DeploymentRegistry::record`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| RegistryError::Json {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DeploymentMap::new(),
            Err(source) => return Err(RegistryError::Io { path, source }),
        };

        Ok(Self {
            path,
            map: Mutex::new(map),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn map(&self) -> MutexGuard<'_, DeploymentMap> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, map: &DeploymentMap) -> Result<(), RegistryError> {
        let io_err = |source| RegistryError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(map).map_err(|source| RegistryError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, content).map_err(io_err)
    }
}

impl DeploymentRegistry for JsonFileDeploymentRegistry {
    fn latest(
        &self,
        network: &str,
        contract: ContractKind,
    ) -> Result<Option<Address>, RegistryError> {
        Ok(latest_in(&self.map(), network, contract))
    }

    fn record(
        &self,
        network: &str,
        contract: ContractKind,
        address: Address,
    ) -> Result<(), RegistryError> {
        let mut map = self.map();
        let mut updated = map.clone();
        record_in(&mut updated, network, contract, address);
        // only keep the entry in memory once it is on disk
        self.write(&updated)?;
        *map = updated;
        Ok(())
    }
}
