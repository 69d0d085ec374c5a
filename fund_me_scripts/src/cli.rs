use clap::{Parser, Subcommand};

/// Deploy the FundMe contract and drive its fund and withdraw flows.
#[derive(Debug, Parser)]
#[command(name = "fund_me", version)]
pub struct Cli {
    /// Network to operate on. Defaults to `default_network` of the config file.
    #[arg(long, global = true, env = "FUND_ME_NETWORK")]
    pub network: Option<String>,

    /// Index of the signing account within the mnemonic.
    #[arg(long, global = true, env = "FUND_ME_ACCOUNT_INDEX", default_value_t = 0)]
    pub account_index: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Resolve the price feed (deploying a mock on local networks) and deploy a new FundMe.
    Deploy,
    /// Fund the latest FundMe with its current entrance fee.
    Fund,
    /// Withdraw all funds of the latest FundMe. Only its owner may do so.
    Withdraw,
    /// `fund` followed by `withdraw` with the same account.
    FundAndWithdraw,
}
