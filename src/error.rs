//! Error types for paygate-core.

use crate::payment::PaymentStatus;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in paygate-core.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested network is not in the registry.
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The requested token is not available on the given network.
    #[error("unsupported token: {token} on {network}")]
    UnsupportedToken {
        /// Network the token was requested on.
        network: String,
        /// The unsupported token symbol.
        token: String,
    },

    /// The request was malformed (bad amount, mismatched network, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No payment exists with the given identifier.
    #[error("payment not found: {0}")]
    PaymentNotFound(Uuid),

    /// The payment is past the point where this operation is allowed.
    #[error("payment already processed (status: {0})")]
    AlreadyProcessed(PaymentStatus),

    /// The chain does not know the given transaction hash.
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    /// The chain reports the transaction as reverted or errored.
    #[error("transaction failed on-chain: {0}")]
    TransactionFailed(String),

    /// The transaction does not match the payment's recipient/amount/token.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// A uniqueness constraint was violated (duplicate id, live reservation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Payment store failure (transient, caller may retry).
    #[error("store error: {0}")]
    Store(String),

    /// Chain adapter failure or timeout (transient, caller may retry).
    #[error("chain error: {0}")]
    Chain(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may retry the operation unchanged.
    ///
    /// Only upstream/transient failures are retryable; validation,
    /// conflict, and not-found errors require a different request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Chain(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Store("down".to_string()).is_retryable());
        assert!(Error::Chain("timeout".to_string()).is_retryable());
        assert!(!Error::UnsupportedNetwork("XYZ".to_string()).is_retryable());
        assert!(!Error::AlreadyProcessed(PaymentStatus::Confirmed).is_retryable());
        assert!(!Error::PaymentNotFound(Uuid::nil()).is_retryable());
    }
}
