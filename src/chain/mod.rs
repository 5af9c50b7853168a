//! Chain adapter capability interface.
//!
//! The lifecycle manager consumes chains through this narrow surface:
//! read a transaction by hash, read confirmation depth, read balances.
//! Genuinely chain-specific work (calldata decoding, balance-delta
//! extraction) lives in the per-family submodules; everything above this
//! trait is chain-agnostic.

pub mod evm;
pub mod mock;
pub mod solana;

pub use mock::MockChainAdapter;

use crate::error::Result;
use crate::registry::ChainFamily;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Fee information attached to a transaction, for the audit log.
#[derive(Debug, Clone, Default)]
pub struct FeeInfo {
    /// Fee paid (gas used on EVM chains, lamport fee on Solana).
    pub fee_paid: Option<Decimal>,
    /// Fee price (gas price; absent on account-model chains).
    pub fee_price: Option<Decimal>,
}

/// The value movement a transaction performs, decoded per family.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferDetails {
    /// Native currency transfer (EVM `value` field).
    Native {
        /// Recipient address.
        to: String,
        /// Transferred amount in display units.
        amount: Decimal,
    },
    /// Token transfer via contract call (decoded ERC-20 calldata).
    Token {
        /// Token contract the call was sent to.
        contract: String,
        /// Recipient decoded from the call arguments.
        to: String,
        /// Transferred amount in display units at the token's decimals.
        amount: Decimal,
    },
    /// Balance delta observed on an account-model chain.
    BalanceDelta {
        /// Account owner whose balance changed.
        owner: String,
        /// Token mint, or `None` for the native balance.
        mint: Option<String>,
        /// Net balance change in display units (positive = received).
        amount: Decimal,
    },
    /// The transaction moves no value recognizable to the gateway.
    None,
}

/// Normalized view of an on-chain transaction.
#[derive(Debug, Clone)]
pub struct TxInfo {
    /// Transaction hash/signature.
    pub hash: String,
    /// Whether execution succeeded on-chain.
    pub succeeded: bool,
    /// Block height or slot, if the transaction is included.
    pub block_height: Option<u64>,
    /// Fee information.
    pub fee: FeeInfo,
    /// Decoded value movement.
    pub transfer: TransferDetails,
}

/// Read-only capability surface of a blockchain network.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Which decoding/validation family this adapter implements.
    fn family(&self) -> ChainFamily;

    /// Fetch a transaction by hash; `None` if the chain does not know it.
    ///
    /// # Errors
    ///
    /// Returns `Chain` if the network is unreachable.
    async fn transaction(&self, tx_hash: &str) -> Result<Option<TxInfo>>;

    /// Confirmation depth of a transaction (0 if unknown or unconfirmed).
    ///
    /// # Errors
    ///
    /// Returns `Chain` if the network is unreachable.
    async fn confirmations(&self, tx_hash: &str) -> Result<u64>;

    /// Native currency balance of an address, in display units.
    ///
    /// # Errors
    ///
    /// Returns `Chain` if the network is unreachable.
    async fn balance(&self, address: &str) -> Result<Decimal>;

    /// Token balance of an address, in display units.
    ///
    /// # Errors
    ///
    /// Returns `Chain` if the network is unreachable.
    async fn token_balance(&self, address: &str, token_address: &str) -> Result<Decimal>;
}
