use std::{env, sync::Arc};

use anyhow::{bail, Context};
use ethers::{
    core::k256::ecdsa::SigningKey,
    middleware::SignerMiddleware,
    providers::{Http, Provider},
    signers::{coins_bip39::English, MnemonicBuilder, Signer, Wallet},
};
use fund_me_orchestrator::{config::NetworkConfig, network::NetworkContext};

pub type EtherSigner = SignerMiddleware<Provider<Http>, Wallet<SigningKey>>;

const MNEMONIC_ENV_VAR: &str = "MNEMONIC";
const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// Mnemonic of the unlocked accounts of anvil, hardhat and ganache's deterministic mode.
const DEV_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// Resolve the signing account for `network` from the environment.
pub fn get_account(network: &NetworkContext, index: u32) -> anyhow::Result<Wallet<SigningKey>> {
    resolve_account(
        network,
        index,
        env::var(PRIVATE_KEY_ENV_VAR).ok(),
        env::var(MNEMONIC_ENV_VAR).ok(),
    )
}

/// local networks: dev account `index` (of `$MNEMONIC` if set);
/// persistent networks: `$PRIVATE_KEY`, else account `index` of `$MNEMONIC`
fn resolve_account(
    network: &NetworkContext,
    index: u32,
    private_key: Option<String>,
    mnemonic: Option<String>,
) -> anyhow::Result<Wallet<SigningKey>> {
    if network.is_local() {
        let phrase = mnemonic.unwrap_or(DEV_MNEMONIC.to_owned());
        return wallet_from_mnemonic(&phrase, index);
    }

    match (private_key, mnemonic) {
        (Some(_), _) if index != 0 => {
            bail!("{PRIVATE_KEY_ENV_VAR} holds a single account, use {MNEMONIC_ENV_VAR} to select account {index}")
        }
        (Some(key), _) => key
            .parse()
            .with_context(|| format!("{PRIVATE_KEY_ENV_VAR} is not a valid private key")),
        (None, Some(phrase)) => wallet_from_mnemonic(&phrase, index),
        (None, None) => bail!(
            "network `{network}` needs {PRIVATE_KEY_ENV_VAR} or {MNEMONIC_ENV_VAR} to be set"
        ),
    }
}

fn wallet_from_mnemonic(phrase: &str, index: u32) -> anyhow::Result<Wallet<SigningKey>> {
    let wallet = MnemonicBuilder::<English>::default()
        .phrase(phrase)
        .index(index)?
        .build()
        .with_context(|| format!("could not derive account {index} from mnemonic"))?;
    Ok(wallet)
}

pub fn get_writer_ethers_client(
    wallet: Wallet<SigningKey>,
    config: &NetworkConfig,
) -> anyhow::Result<Arc<EtherSigner>> {
    let wallet = wallet.with_chain_id(config.chain_id);

    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
        .with_context(|| format!("invalid rpc url {}", config.rpc_url))?;
    Ok(Arc::new(SignerMiddleware::new(provider, wallet)))
}
