use async_trait::async_trait;
use ethers::types::{Address, TransactionReceipt, I256, U256};

pub mod ethers_client;

pub use ethers_client::EthersChainClient;

/// Failures reported by the chain boundary.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The contract (or the EVM) rejected the call. `reason` is the decoded revert string
    /// when one was returned, otherwise the raw revert data.
    #[error("execution reverted: {reason}")]
    Reverted { reason: String },

    #[error("transaction was dropped from the mempool before being mined")]
    Dropped,

    #[error("contract artifact error: {0}")]
    Artifact(String),

    #[error("rpc error: {0}")]
    Rpc(String),
}

/// The operations the orchestrator needs from a blockchain client.
///
/// A handle is bound to one signing account: every deployment and transaction it sends is
/// signed by [`ChainClient::account`]. Reads never send a transaction. Every method resolves
/// only once the node has answered (and, for transactions, once the receipt is available).
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The account that signs this handle's transactions.
    fn account(&self) -> Address;

    /// Deploy a `MockV3Aggregator(decimals, initial_answer)`.
    async fn deploy_mock_price_feed(
        &self,
        decimals: u8,
        initial_answer: I256,
    ) -> Result<Address, ChainError>;

    /// Deploy `FundMe(price_feed)`.
    async fn deploy_fund_me(&self, price_feed: Address) -> Result<Address, ChainError>;

    /// Read `getEntranceFee()` of the `FundMe` at `fund_me`.
    async fn entrance_fee(&self, fund_me: Address) -> Result<U256, ChainError>;

    /// Send `fund()` carrying `value` wei.
    async fn fund(&self, fund_me: Address, value: U256) -> Result<TransactionReceipt, ChainError>;

    /// Send `withdrawAmountFunded()`.
    async fn withdraw(&self, fund_me: Address) -> Result<TransactionReceipt, ChainError>;
}

#[cfg(test)]
pub mod test_utils {
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use async_trait::async_trait;
    use ethers::{
        abi::Token,
        types::{Address, TransactionReceipt, H256, I256, U256, U64},
    };

    use super::{ChainClient, ChainError};
    use crate::{
        contracts::ContractKind,
        deployer::DeployedContract,
        verify::{SourceVerifier, VerifyError},
    };

    pub const NOT_ENOUGH_ETH: &str = "You need to spend more ETH!";
    pub const ONLY_OWNER: &str = "Only the owner can withdraw";

    pub fn test_account(id: u64) -> Address {
        Address::from_low_u64_be(0xacc0 + id)
    }

    /// What the fake FundMe contract holds.
    #[derive(Clone, Debug, Default)]
    pub struct FakeFundMe {
        pub owner: Address,
        pub price_feed: Address,
        pub balance: U256,
        pub funded: HashMap<Address, U256>,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct SentTx {
        pub from: Address,
        pub to: Address,
        pub method: &'static str,
        pub value: U256,
    }

    #[derive(Default)]
    struct FakeLedger {
        next_address: u64,
        next_tx: u64,
        price_feeds: HashMap<Address, I256>,
        fund_mes: HashMap<Address, FakeFundMe>,
        deployments: Vec<(ContractKind, Address)>,
        sent: Vec<SentTx>,
        fail_next_deploy: bool,
    }

    impl FakeLedger {
        fn new_address(&mut self) -> Address {
            self.next_address += 1;
            Address::from_low_u64_be(0xc0de_0000 + self.next_address)
        }

        fn receipt(&mut self, from: Address, to: Address) -> TransactionReceipt {
            self.next_tx += 1;
            TransactionReceipt {
                transaction_hash: H256::from_low_u64_be(self.next_tx),
                from,
                to: Some(to),
                status: Some(U64::one()),
                ..Default::default()
            }
        }

        fn deploy(&mut self, kind: ContractKind) -> Result<Address, ChainError> {
            if std::mem::take(&mut self.fail_next_deploy) {
                return Err(ChainError::Reverted {
                    reason: format!("{kind} constructor reverted"),
                });
            }
            let address = self.new_address();
            self.deployments.push((kind, address));
            Ok(address)
        }

        /// Mirrors `FundMe.getEntranceFee()`: 50 USD worth of wei at the feed's price, plus one.
        fn entrance_fee(&self, fund_me: Address) -> Result<U256, ChainError> {
            let contract = self.fund_mes.get(&fund_me).ok_or_else(|| ChainError::Reverted {
                reason: String::from("call to non-contract"),
            })?;
            let answer = self
                .price_feeds
                .get(&contract.price_feed)
                .ok_or_else(|| ChainError::Reverted {
                    reason: String::from("price feed is not a contract"),
                })?;
            let price = answer.into_raw() * U256::exp10(10);
            let minimum_usd = U256::from(50) * U256::exp10(18);
            Ok(minimum_usd * U256::exp10(18) / price + 1)
        }
    }

    /// An in-memory chain shared between several account handles.
    #[derive(Clone, Default)]
    pub struct FakeChain {
        ledger: Arc<Mutex<FakeLedger>>,
    }

    impl FakeChain {
        pub fn new() -> Self {
            Self::default()
        }

        /// A handle signing as `account`.
        pub fn connect(&self, account: Address) -> FakeChainClient {
            FakeChainClient {
                account,
                ledger: self.ledger.clone(),
            }
        }

        /// Equivalent of `MockV3Aggregator.updateAnswer`. Also registers a "live" feed
        /// at an address nothing deployed.
        pub fn set_answer(&self, price_feed: Address, answer: I256) {
            self.ledger().price_feeds.insert(price_feed, answer);
        }

        pub fn fail_next_deploy(&self) {
            self.ledger().fail_next_deploy = true;
        }

        pub fn deployments_of(&self, kind: ContractKind) -> Vec<Address> {
            self.ledger()
                .deployments
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, address)| *address)
                .collect()
        }

        pub fn fund_me(&self, address: Address) -> Option<FakeFundMe> {
            self.ledger().fund_mes.get(&address).cloned()
        }

        pub fn sent(&self) -> Vec<SentTx> {
            self.ledger().sent.clone()
        }

        fn ledger(&self) -> std::sync::MutexGuard<'_, FakeLedger> {
            self.ledger.lock().unwrap()
        }
    }

    pub struct FakeChainClient {
        account: Address,
        ledger: Arc<Mutex<FakeLedger>>,
    }

    #[async_trait]
    impl ChainClient for FakeChainClient {
        fn account(&self) -> Address {
            self.account
        }

        async fn deploy_mock_price_feed(
            &self,
            _decimals: u8,
            initial_answer: I256,
        ) -> Result<Address, ChainError> {
            let mut ledger = self.ledger.lock().unwrap();
            let address = ledger.deploy(ContractKind::MockV3Aggregator)?;
            ledger.price_feeds.insert(address, initial_answer);
            Ok(address)
        }

        async fn deploy_fund_me(&self, price_feed: Address) -> Result<Address, ChainError> {
            let mut ledger = self.ledger.lock().unwrap();
            let address = ledger.deploy(ContractKind::FundMe)?;
            ledger.fund_mes.insert(
                address,
                FakeFundMe {
                    owner: self.account,
                    price_feed,
                    ..Default::default()
                },
            );
            Ok(address)
        }

        async fn entrance_fee(&self, fund_me: Address) -> Result<U256, ChainError> {
            self.ledger.lock().unwrap().entrance_fee(fund_me)
        }

        async fn fund(
            &self,
            fund_me: Address,
            value: U256,
        ) -> Result<TransactionReceipt, ChainError> {
            let mut ledger = self.ledger.lock().unwrap();
            let fee = ledger.entrance_fee(fund_me)?;
            if value < fee {
                return Err(ChainError::Reverted {
                    reason: NOT_ENOUGH_ETH.to_owned(),
                });
            }
            let contract = ledger.fund_mes.get_mut(&fund_me).unwrap();
            contract.balance += value;
            *contract.funded.entry(self.account).or_default() += value;
            ledger.sent.push(SentTx {
                from: self.account,
                to: fund_me,
                method: "fund",
                value,
            });
            Ok(ledger.receipt(self.account, fund_me))
        }

        async fn withdraw(&self, fund_me: Address) -> Result<TransactionReceipt, ChainError> {
            let mut ledger = self.ledger.lock().unwrap();
            let contract = ledger
                .fund_mes
                .get_mut(&fund_me)
                .ok_or_else(|| ChainError::Reverted {
                    reason: String::from("call to non-contract"),
                })?;
            if contract.owner != self.account {
                return Err(ChainError::Reverted {
                    reason: ONLY_OWNER.to_owned(),
                });
            }
            contract.balance = U256::zero();
            contract.funded.clear();
            ledger.sent.push(SentTx {
                from: self.account,
                to: fund_me,
                method: "withdrawAmountFunded",
                value: U256::zero(),
            });
            Ok(ledger.receipt(self.account, fund_me))
        }
    }

    /// Counts verification requests and either accepts or rejects all of them.
    #[derive(Default)]
    pub struct CountingVerifier {
        pub calls: AtomicUsize,
        pub reject: bool,
    }

    impl CountingVerifier {
        pub fn rejecting() -> Self {
            Self {
                reject: true,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceVerifier for CountingVerifier {
        async fn verify(
            &self,
            _contract: &DeployedContract,
            _constructor_args: &[Token],
        ) -> Result<String, VerifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(VerifyError::Etherscan(String::from(
                    "Unable to locate ContractCode",
                )));
            }
            Ok(String::from("guid"))
        }
    }
}
