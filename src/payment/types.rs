//! Core payment data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a payment.
///
/// Transitions are monotonic: `pending -> pending_confirmation -> confirmed`,
/// `pending -> expired`, and any pre-terminal state `-> failed` (external
/// failure reporting only; never produced by the core itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting a verification attempt.
    Pending,
    /// Verified on-chain but below the confirmation threshold.
    PendingConfirmation,
    /// Verified and sufficiently confirmed (terminal).
    Confirmed,
    /// Timed out with no verification attempt (terminal).
    Expired,
    /// Abandoned via external failure reporting (terminal).
    Failed,
}

impl PaymentStatus {
    /// Whether no further transitions are permitted from this status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Expired | Self::Failed)
    }

    /// Canonical snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingConfirmation => "pending_confirmation",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment request tracked by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier, immutable after creation.
    pub id: Uuid,
    /// Merchant-requested amount.
    pub original_amount: Decimal,
    /// Disambiguated amount actually expected on-chain; unique among
    /// non-terminal payments on the same network.
    pub amount: Decimal,
    /// Caller-supplied correlation key (not unique).
    pub order_id: String,
    /// Network name (registry key, uppercase).
    pub network: String,
    /// Token symbol (native currency symbol for native payments).
    pub token: String,
    /// Destination wallet address.
    pub wallet_address: String,
    /// Token contract/mint address; `None` for native payments.
    pub contract_address: Option<String>,
    /// Current lifecycle status.
    pub status: PaymentStatus,
    /// Verified transaction hash, set by verification.
    pub tx_hash: Option<String>,
    /// Confirmation depth observed at the last verification.
    pub confirmations: u64,
    /// Chain-specific payment URI for wallet/QR display.
    pub payment_uri: String,
    /// Free-form caller annotations, persisted verbatim.
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Expiry deadline (`created_at + payment timeout`).
    pub expires_at: DateTime<Utc>,
    /// Time of the last successful verification.
    pub verified_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Whether the payment is past its expiry deadline.
    #[must_use]
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Partial update of a payment's mutable fields.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    /// New status.
    pub status: Option<PaymentStatus>,
    /// Verified transaction hash.
    pub tx_hash: Option<String>,
    /// Observed confirmation depth.
    pub confirmations: Option<u64>,
    /// Verification timestamp.
    pub verified_at: Option<DateTime<Utc>>,
}

impl PaymentUpdate {
    /// Update that only changes the status.
    #[must_use]
    pub fn status(status: PaymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Append-only audit record of a verification attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLogEntry {
    /// Payment this attempt belongs to.
    pub payment_id: Uuid,
    /// Transaction hash that was verified.
    pub tx_hash: String,
    /// Status the payment transitioned to.
    pub status: PaymentStatus,
    /// Confirmation depth at verification time.
    pub confirmations: u64,
    /// Block height / slot of the transaction, if known.
    pub block_height: Option<u64>,
    /// Fee paid (gas used / lamport fee), if known.
    pub fee_paid: Option<Decimal>,
    /// Fee price (gas price; zero-equivalent on account-model chains).
    pub fee_price: Option<Decimal>,
    /// When the entry was recorded.
    pub logged_at: DateTime<Utc>,
}

/// Filter for payment listings.
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    /// Restrict to a single status.
    pub status: Option<PaymentStatus>,
    /// Restrict to a single network.
    pub network: Option<String>,
    /// Maximum number of items to return.
    pub limit: usize,
    /// Number of items to skip.
    pub offset: usize,
}

/// One page of a payment listing, newest-first.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentPage {
    /// Payments on this page.
    pub items: Vec<Payment>,
    /// Total matching payments before pagination.
    pub total: usize,
}
