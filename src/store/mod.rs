//! Payment store interface and implementations.
//!
//! The store is the single source of truth for payments, used-amount
//! reservations, and the append-only transaction audit log. All state
//! mutation goes through its per-record operations; the lifecycle manager
//! holds no long-lived payment state of its own.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::payment::{
    Payment, PaymentFilter, PaymentPage, PaymentStatus, PaymentUpdate, TransactionLogEntry,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Durable record of payments, reserved amounts, and the audit log.
///
/// `reserve_amount` must be atomic with respect to concurrent reservation
/// attempts for the same `(amount, network)` pair: insert-if-absent, not
/// check-then-insert. This primitive, not in-process locking, is what
/// enforces the amount-uniqueness invariant across request handlers.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Insert a new payment.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if a payment with the same id already exists.
    async fn create_payment(&self, payment: Payment) -> Result<()>;

    /// Fetch a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn payment(&self, id: Uuid) -> Result<Option<Payment>>;

    /// Apply a partial update, guarded by the caller's observed status.
    ///
    /// The update only takes effect while the payment's current status is
    /// in `expect`; this is the compare-and-set that makes concurrent
    /// verification single-shot and keeps terminal states immutable.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` if no such payment exists, or
    /// `AlreadyProcessed` (carrying the current status) if the guard fails.
    async fn update_payment(
        &self,
        id: Uuid,
        expect: &[PaymentStatus],
        update: PaymentUpdate,
    ) -> Result<Payment>;

    /// Resolve which payment an incoming amount corresponds to.
    ///
    /// Matches non-terminal payments only, by exact decimal equality.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn find_payment_by_amount(
        &self,
        amount: Decimal,
        network: &str,
    ) -> Result<Option<Payment>>;

    /// List payments newest-first with offset/limit pagination.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn list_payments(&self, filter: &PaymentFilter) -> Result<PaymentPage>;

    /// Whether a live reservation exists for `(amount, network)`.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn is_amount_reserved(&self, amount: Decimal, network: &str) -> Result<bool>;

    /// Claim `(amount, network)` until `expires_at`.
    ///
    /// Returns `false` if a live reservation already holds the pair.
    /// Lapsed reservations are replaced.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn reserve_amount(
        &self,
        amount: Decimal,
        network: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Release a reservation so the amount can be reused.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn release_amount(&self, amount: Decimal, network: &str) -> Result<()>;

    /// Append an audit log entry. Entries are never updated or deleted.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn append_transaction_log(&self, entry: TransactionLogEntry) -> Result<u64>;

    /// Ids of `pending` payments whose expiry deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn find_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>>;

    /// Housekeeping: drop lapsed reservations and terminal payments older
    /// than the retention window. Best-effort, not correctness-critical.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    async fn purge_expired(&self, now: DateTime<Utc>, retention: Duration) -> Result<u64>;
}
