//! Test-double chain adapter.
//!
//! Backs the sandbox mode and the test suite: the same lifecycle manager
//! runs against this adapter instead of a live RPC client. Injected EVM
//! transactions are stored as raw calldata and decoded through
//! [`crate::chain::evm`] on read, so the real decoding path is exercised.

use crate::chain::{evm, solana, ChainAdapter, FeeInfo, TransferDetails, TxInfo};
use crate::error::{Error, Result};
use crate::payment::Payment;
use crate::registry::ChainFamily;
use async_trait::async_trait;
use parking_lot::RwLock;
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

enum MockTx {
    Evm {
        to: String,
        input: String,
        value_raw: u128,
        native_decimals: u32,
        token_decimals: u32,
        succeeded: bool,
        block_height: u64,
    },
    Solana {
        owner: String,
        mint: Option<String>,
        pre_lamports: u64,
        post_lamports: u64,
        pre_tokens: Vec<solana::TokenBalanceSnapshot>,
        post_tokens: Vec<solana::TokenBalanceSnapshot>,
        succeeded: bool,
        slot: u64,
    },
}

/// Mock [`ChainAdapter`] with injectable transactions and balances.
pub struct MockChainAdapter {
    family: ChainFamily,
    txs: RwLock<HashMap<String, MockTx>>,
    confirmations: RwLock<HashMap<String, u64>>,
    balances: RwLock<HashMap<String, Decimal>>,
    token_balances: RwLock<HashMap<(String, String), Decimal>>,
    unreachable: AtomicBool,
}

impl MockChainAdapter {
    /// Create a mock adapter for the given family.
    #[must_use]
    pub fn new(family: ChainFamily) -> Self {
        Self {
            family,
            txs: RwLock::new(HashMap::new()),
            confirmations: RwLock::new(HashMap::new()),
            balances: RwLock::new(HashMap::new()),
            token_balances: RwLock::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Simulate the network being unreachable; all calls fail transiently.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Set the confirmation depth reported for a transaction.
    pub fn set_confirmations(&self, tx_hash: &str, confirmations: u64) {
        self.confirmations
            .write()
            .insert(tx_hash.to_string(), confirmations);
    }

    /// Set the native balance reported for an address.
    pub fn set_balance(&self, address: &str, balance: Decimal) {
        self.balances.write().insert(address.to_string(), balance);
    }

    /// Set the token balance reported for an address.
    pub fn set_token_balance(&self, address: &str, token_address: &str, balance: Decimal) {
        self.token_balances
            .write()
            .insert((address.to_string(), token_address.to_string()), balance);
    }

    /// Inject a token transfer with the given hash.
    ///
    /// On the EVM family this fabricates ERC-20 `transfer` calldata; on
    /// the Solana family it fabricates pre/post token balance snapshots.
    pub fn inject_token_transfer(
        &self,
        tx_hash: &str,
        contract: &str,
        to: &str,
        amount: Decimal,
        decimals: u32,
        confirmations: u64,
    ) {
        let tx = match self.family {
            ChainFamily::Evm => {
                let raw = evm::to_base_units(amount, decimals).unwrap_or(0);
                MockTx::Evm {
                    to: contract.to_string(),
                    input: evm::encode_transfer_call(to, raw),
                    value_raw: 0,
                    native_decimals: 18,
                    token_decimals: decimals,
                    succeeded: true,
                    block_height: random_block_height(),
                }
            }
            ChainFamily::Solana => MockTx::Solana {
                owner: to.to_string(),
                mint: Some(contract.to_string()),
                pre_lamports: 0,
                post_lamports: 0,
                pre_tokens: vec![],
                post_tokens: vec![solana::TokenBalanceSnapshot {
                    owner: to.to_string(),
                    mint: contract.to_string(),
                    amount,
                }],
                succeeded: true,
                slot: random_block_height(),
            },
        };
        self.txs.write().insert(tx_hash.to_string(), tx);
        self.set_confirmations(tx_hash, confirmations);
    }

    /// Inject a native currency transfer with the given hash.
    pub fn inject_native_transfer(
        &self,
        tx_hash: &str,
        to: &str,
        amount: Decimal,
        decimals: u32,
        confirmations: u64,
    ) {
        let tx = match self.family {
            ChainFamily::Evm => MockTx::Evm {
                to: to.to_string(),
                input: "0x".to_string(),
                value_raw: evm::to_base_units(amount, decimals).unwrap_or(0),
                native_decimals: decimals,
                token_decimals: 0,
                succeeded: true,
                block_height: random_block_height(),
            },
            ChainFamily::Solana => {
                let lamports = evm::to_base_units(amount, solana::NATIVE_DECIMALS)
                    .and_then(|v| u64::try_from(v).ok())
                    .unwrap_or(0);
                MockTx::Solana {
                    owner: to.to_string(),
                    mint: None,
                    pre_lamports: 0,
                    post_lamports: lamports,
                    pre_tokens: vec![],
                    post_tokens: vec![],
                    succeeded: true,
                    slot: random_block_height(),
                }
            }
        };
        self.txs.write().insert(tx_hash.to_string(), tx);
        self.set_confirmations(tx_hash, confirmations);
    }

    /// Inject a transaction the chain reports as failed.
    pub fn inject_failed(&self, tx_hash: &str) {
        let tx = match self.family {
            ChainFamily::Evm => MockTx::Evm {
                to: String::new(),
                input: "0x".to_string(),
                value_raw: 0,
                native_decimals: 18,
                token_decimals: 0,
                succeeded: false,
                block_height: random_block_height(),
            },
            ChainFamily::Solana => MockTx::Solana {
                owner: String::new(),
                mint: None,
                pre_lamports: 0,
                post_lamports: 0,
                pre_tokens: vec![],
                post_tokens: vec![],
                succeeded: false,
                slot: random_block_height(),
            },
        };
        self.txs.write().insert(tx_hash.to_string(), tx);
    }

    /// Fabricate a transaction that pays a payment exactly.
    ///
    /// Returns the generated transaction hash, ready to pass to
    /// `verify_payment`. `decimals` is the paid asset's precision.
    pub fn fund_payment(&self, payment: &Payment, decimals: u32, confirmations: u64) -> String {
        let tx_hash = random_tx_hash();
        match &payment.contract_address {
            Some(contract) => self.inject_token_transfer(
                &tx_hash,
                contract,
                &payment.wallet_address,
                payment.amount,
                decimals,
                confirmations,
            ),
            None => self.inject_native_transfer(
                &tx_hash,
                &payment.wallet_address,
                payment.amount,
                decimals,
                confirmations,
            ),
        }
        debug!("Funded payment {} with mock tx {}", payment.id, tx_hash);
        tx_hash
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(Error::Chain("mock network unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainAdapter for MockChainAdapter {
    fn family(&self) -> ChainFamily {
        self.family
    }

    async fn transaction(&self, tx_hash: &str) -> Result<Option<TxInfo>> {
        self.check_reachable()?;
        let txs = self.txs.read();
        let Some(tx) = txs.get(tx_hash) else {
            return Ok(None);
        };

        let info = match tx {
            MockTx::Evm {
                to,
                input,
                value_raw,
                native_decimals,
                token_decimals,
                succeeded,
                block_height,
            } => {
                let transfer = if let Some((recipient, raw)) = evm::decode_transfer_call(input) {
                    match evm::from_base_units(raw, *token_decimals) {
                        Some(amount) => TransferDetails::Token {
                            contract: to.clone(),
                            to: recipient,
                            amount,
                        },
                        None => TransferDetails::None,
                    }
                } else if *value_raw > 0 {
                    match evm::from_base_units(*value_raw, *native_decimals) {
                        Some(amount) => TransferDetails::Native {
                            to: to.clone(),
                            amount,
                        },
                        None => TransferDetails::None,
                    }
                } else {
                    TransferDetails::None
                };

                TxInfo {
                    hash: tx_hash.to_string(),
                    succeeded: *succeeded,
                    block_height: Some(*block_height),
                    fee: FeeInfo::default(),
                    transfer,
                }
            }
            MockTx::Solana {
                owner,
                mint,
                pre_lamports,
                post_lamports,
                pre_tokens,
                post_tokens,
                succeeded,
                slot,
            } => {
                let transfer = match mint {
                    Some(mint) => TransferDetails::BalanceDelta {
                        owner: owner.clone(),
                        mint: Some(mint.clone()),
                        amount: solana::token_delta(pre_tokens, post_tokens, owner, mint),
                    },
                    None => TransferDetails::BalanceDelta {
                        owner: owner.clone(),
                        mint: None,
                        amount: solana::native_delta(*pre_lamports, *post_lamports),
                    },
                };

                TxInfo {
                    hash: tx_hash.to_string(),
                    succeeded: *succeeded,
                    block_height: Some(*slot),
                    fee: FeeInfo {
                        fee_paid: Some(Decimal::new(5000, 9)),
                        fee_price: None,
                    },
                    transfer,
                }
            }
        };

        Ok(Some(info))
    }

    async fn confirmations(&self, tx_hash: &str) -> Result<u64> {
        self.check_reachable()?;
        Ok(self
            .confirmations
            .read()
            .get(tx_hash)
            .copied()
            .unwrap_or(0))
    }

    async fn balance(&self, address: &str) -> Result<Decimal> {
        self.check_reachable()?;
        Ok(self
            .balances
            .read()
            .get(address)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn token_balance(&self, address: &str, token_address: &str) -> Result<Decimal> {
        self.check_reachable()?;
        Ok(self
            .token_balances
            .read()
            .get(&(address.to_string(), token_address.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }
}

fn random_tx_hash() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    format!("0x{}", hex::encode(bytes))
}

fn random_block_height() -> u64 {
    rand::thread_rng().gen_range(20_000_000..21_000_000)
}
