use std::fmt;

/// Networks treated as local/ephemeral when the configuration does not say otherwise.
pub const DEFAULT_LOCAL_NETWORKS: &[&str] = &["development", "ganache-local", "anvil", "hardhat"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkKind {
    /// A throwaway dev chain: no live oracle, mocks get deployed.
    Local,
    Persistent,
}

/// Classify `network_id` against the set of known local network ids.
/// Anything not in the set is persistent.
pub fn classify<S: AsRef<str>>(network_id: &str, local_networks: &[S]) -> NetworkKind {
    if local_networks.iter().any(|id| id.as_ref() == network_id) {
        NetworkKind::Local
    } else {
        NetworkKind::Persistent
    }
}

/// The active network of one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkContext {
    id: String,
    kind: NetworkKind,
}

impl NetworkContext {
    pub fn new<S: AsRef<str>>(id: impl Into<String>, local_networks: &[S]) -> Self {
        let id = id.into();
        let kind = classify(&id, local_networks);
        Self { id, kind }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    pub fn is_local(&self) -> bool {
        self.kind == NetworkKind::Local
    }
}

impl fmt::Display for NetworkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
