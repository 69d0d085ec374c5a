use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use ethers::{
    abi::{Abi, Detokenize, Tokenize},
    contract::{ContractCall, ContractError, ContractFactory},
    providers::Middleware,
    types::{Address, Bytes, TransactionReceipt, U64},
};
use serde::{Deserialize, Serialize};

use crate::chain::ChainError;

pub mod fund_me;
pub mod mock_v3_aggregator;

/// The contracts this crate deploys. Also the key of the deployment registry and the
/// file stem of the compiled artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    FundMe,
    MockV3Aggregator,
}

impl ContractKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::FundMe => "FundMe",
            ContractKind::MockV3Aggregator => "MockV3Aggregator",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compiled contract artifacts on disk, one `<ContractName>.json` per contract.
///
/// Accepts the brownie/hardhat layout (`"bytecode": "0x.."`) as well as the foundry
/// layout (`"bytecode": { "object": "0x.." }`).
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

#[derive(Deserialize)]
struct Artifact {
    bytecode: ArtifactBytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    Hex(String),
    Object { object: String },
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, kind: ContractKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.name()))
    }

    pub fn bytecode(&self, kind: ContractKind) -> Result<Bytes, ChainError> {
        let path = self.path_of(kind);
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ChainError::Artifact(format!("{}: {e}", path.display())))?;
        parse_bytecode(&raw, &path)
    }
}

fn parse_bytecode(raw: &str, path: &Path) -> Result<Bytes, ChainError> {
    let artifact: Artifact = serde_json::from_str(raw)
        .map_err(|e| ChainError::Artifact(format!("{}: {e}", path.display())))?;
    let hex_str = match artifact.bytecode {
        ArtifactBytecode::Hex(hex_str) => hex_str,
        ArtifactBytecode::Object { object } => object,
    };
    let hex_str = hex_str.trim_start_matches("0x");
    if hex_str.is_empty() {
        // abstract contracts and interfaces compile to no bytecode
        return Err(ChainError::Artifact(format!(
            "{}: artifact has no bytecode",
            path.display()
        )));
    }
    let bytes = hex::decode(hex_str)
        .map_err(|e| ChainError::Artifact(format!("{}: {e}", path.display())))?;
    Ok(bytes.into())
}

/// Deploy `bytecode` with `args` and wait for the creation receipt.
pub(crate) async fn deploy_contract<M, T>(
    client: Arc<M>,
    abi: Abi,
    bytecode: Bytes,
    args: T,
    confirmations: usize,
) -> Result<Address, ChainError>
where
    M: Middleware + 'static,
    T: Tokenize,
{
    let factory = ContractFactory::new(abi, bytecode, client);
    let (contract, receipt) = factory
        .deploy(args)
        .map_err(contract_error)?
        .confirmations(confirmations)
        .send_with_receipt()
        .await
        .map_err(contract_error)?;

    ensure_success(&receipt)?;
    Ok(contract.address())
}

/// Send a state-changing call and wait for its receipt.
pub(crate) async fn send_and_confirm<M, D>(
    call: ContractCall<M, D>,
    confirmations: usize,
) -> Result<TransactionReceipt, ChainError>
where
    M: Middleware + 'static,
    D: Detokenize,
{
    let pending = call.send().await.map_err(contract_error)?;
    let receipt = pending
        .confirmations(confirmations)
        .await
        .map_err(|e| ChainError::Rpc(e.to_string()))?
        .ok_or(ChainError::Dropped)?;

    ensure_success(&receipt)?;
    Ok(receipt)
}

fn ensure_success(receipt: &TransactionReceipt) -> Result<(), ChainError> {
    if receipt.status == Some(U64::zero()) {
        return Err(ChainError::Reverted {
            reason: format!("transaction {:?} reverted", receipt.transaction_hash),
        });
    }
    Ok(())
}

/// Surface revert reasons as-is; everything else is a transport/node failure.
pub(crate) fn contract_error<M: Middleware>(e: ContractError<M>) -> ChainError {
    if let Some(reason) = e.decode_revert::<String>() {
        return ChainError::Reverted { reason };
    }
    if let Some(data) = e.as_revert() {
        return ChainError::Reverted {
            reason: data.to_string(),
        };
    }
    ChainError::Rpc(e.to_string())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{parse_bytecode, ArtifactStore, ContractKind};
    use crate::chain::ChainError;

    #[test]
    fn test_parse_brownie_and_foundry_artifacts() {
        let path = Path::new("FundMe.json");

        let brownie = r#"{ "contractName": "FundMe", "bytecode": "6080604052" }"#;
        let bytes = parse_bytecode(brownie, path).unwrap();
        assert_eq!(bytes.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);

        let hardhat = r#"{ "abi": [], "bytecode": "0x6080604052" }"#;
        assert_eq!(parse_bytecode(hardhat, path).unwrap(), bytes);

        let foundry = r#"{ "abi": [], "bytecode": { "object": "0x6080604052", "linkReferences": {} } }"#;
        assert_eq!(parse_bytecode(foundry, path).unwrap(), bytes);
    }

    #[test]
    fn test_empty_bytecode_is_rejected() {
        let err = parse_bytecode(r#"{ "bytecode": "0x" }"#, Path::new("I.json")).unwrap_err();
        assert!(matches!(err, ChainError::Artifact(_)));
    }

    #[test]
    fn test_artifact_store_reads_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let missing = store.bytecode(ContractKind::FundMe).unwrap_err();
        assert!(matches!(missing, ChainError::Artifact(_)));

        std::fs::write(
            store.path_of(ContractKind::MockV3Aggregator),
            r#"{ "bytecode": "0x00" }"#,
        )
        .unwrap();
        let bytes = store.bytecode(ContractKind::MockV3Aggregator).unwrap();
        assert_eq!(bytes.to_vec(), vec![0x00]);
    }
}
