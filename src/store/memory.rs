//! In-memory payment store.
//!
//! Reference implementation of [`PaymentStore`] backed by `parking_lot`
//! maps. Used by the sandbox and the test suite; a SQL-backed store
//! implements the same trait for production deployments.
//!
//! Locks are only held across in-memory operations, never across awaits.

use crate::error::{Error, Result};
use crate::payment::{
    Payment, PaymentFilter, PaymentPage, PaymentStatus, PaymentUpdate, TransactionLogEntry,
};
use crate::store::PaymentStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// In-memory [`PaymentStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    payments: RwLock<HashMap<Uuid, Payment>>,
    reservations: RwLock<HashMap<(String, Decimal), DateTime<Utc>>>,
    transaction_log: RwLock<Vec<(u64, TransactionLogEntry)>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payments.
    #[must_use]
    pub fn payment_count(&self) -> usize {
        self.payments.read().len()
    }

    /// Number of live reservations at `now`.
    #[must_use]
    pub fn live_reservation_count(&self, now: DateTime<Utc>) -> usize {
        self.reservations
            .read()
            .values()
            .filter(|expires| **expires > now)
            .count()
    }

    /// Snapshot of the audit log.
    #[must_use]
    pub fn transaction_log(&self) -> Vec<TransactionLogEntry> {
        self.transaction_log
            .read()
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    fn reservation_key(amount: Decimal, network: &str) -> (String, Decimal) {
        (network.to_uppercase(), amount.normalize())
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn create_payment(&self, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write();
        if payments.contains_key(&payment.id) {
            return Err(Error::Conflict(format!(
                "payment {} already exists",
                payment.id
            )));
        }
        debug!("Stored payment {} ({})", payment.id, payment.network);
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn payment(&self, id: Uuid) -> Result<Option<Payment>> {
        Ok(self.payments.read().get(&id).cloned())
    }

    async fn update_payment(
        &self,
        id: Uuid,
        expect: &[PaymentStatus],
        update: PaymentUpdate,
    ) -> Result<Payment> {
        let mut payments = self.payments.write();
        let payment = payments.get_mut(&id).ok_or(Error::PaymentNotFound(id))?;

        if !expect.contains(&payment.status) {
            return Err(Error::AlreadyProcessed(payment.status));
        }

        if let Some(status) = update.status {
            payment.status = status;
        }
        if let Some(tx_hash) = update.tx_hash {
            payment.tx_hash = Some(tx_hash);
        }
        if let Some(confirmations) = update.confirmations {
            payment.confirmations = confirmations;
        }
        if let Some(verified_at) = update.verified_at {
            payment.verified_at = Some(verified_at);
        }

        debug!("Updated payment {} -> {}", id, payment.status);
        Ok(payment.clone())
    }

    async fn find_payment_by_amount(
        &self,
        amount: Decimal,
        network: &str,
    ) -> Result<Option<Payment>> {
        let amount = amount.normalize();
        Ok(self
            .payments
            .read()
            .values()
            .find(|p| {
                !p.status.is_terminal()
                    && p.network.eq_ignore_ascii_case(network)
                    && p.amount == amount
            })
            .cloned())
    }

    async fn list_payments(&self, filter: &PaymentFilter) -> Result<PaymentPage> {
        let payments = self.payments.read();
        let mut matches: Vec<&Payment> = payments
            .values()
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| {
                filter
                    .network
                    .as_ref()
                    .is_none_or(|n| p.network.eq_ignore_ascii_case(n))
            })
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len();
        let items = matches
            .into_iter()
            .skip(filter.offset)
            .take(if filter.limit == 0 {
                usize::MAX
            } else {
                filter.limit
            })
            .cloned()
            .collect();

        Ok(PaymentPage { items, total })
    }

    async fn is_amount_reserved(&self, amount: Decimal, network: &str) -> Result<bool> {
        let key = Self::reservation_key(amount, network);
        Ok(self
            .reservations
            .read()
            .get(&key)
            .is_some_and(|expires| *expires > Utc::now()))
    }

    async fn reserve_amount(
        &self,
        amount: Decimal,
        network: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let key = Self::reservation_key(amount, network);
        let now = Utc::now();
        let mut reservations = self.reservations.write();

        match reservations.get(&key) {
            Some(existing) if *existing > now => Ok(false),
            _ => {
                reservations.insert(key, expires_at);
                Ok(true)
            }
        }
    }

    async fn release_amount(&self, amount: Decimal, network: &str) -> Result<()> {
        let key = Self::reservation_key(amount, network);
        self.reservations.write().remove(&key);
        Ok(())
    }

    async fn append_transaction_log(&self, entry: TransactionLogEntry) -> Result<u64> {
        let mut log = self.transaction_log.write();
        let id = log.len() as u64 + 1;
        log.push((id, entry));
        Ok(id)
    }

    async fn find_expirable(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        Ok(self
            .payments
            .read()
            .values()
            .filter(|p| p.status == PaymentStatus::Pending && p.is_past_expiry(now))
            .map(|p| p.id)
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>, retention: Duration) -> Result<u64> {
        let mut purged = 0u64;

        {
            let mut reservations = self.reservations.write();
            let before = reservations.len();
            reservations.retain(|_, expires| *expires > now);
            purged += (before - reservations.len()) as u64;
        }

        {
            let cutoff = now - retention;
            let mut payments = self.payments.write();
            let before = payments.len();
            payments.retain(|_, p| !(p.status.is_terminal() && p.created_at < cutoff));
            purged += (before - payments.len()) as u64;
        }

        Ok(purged)
    }
}
