//! Unique payment-amount allocation.
//!
//! All payments on a network share one receiving wallet, so an incoming
//! transfer can only be attributed by its exact value. The disambiguator
//! decorates each requested amount with a small random fractional offset
//! and reserves the result in the store, guaranteeing that no two live
//! payments on the same network expect the same value.

use crate::error::Result;
use crate::registry::ChainFamily;
use crate::store::PaymentStore;
use chrono::{Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Bounded number of random offsets tried before the deterministic
/// fallback takes over.
pub const MAX_RESERVE_ATTEMPTS: u32 = 50;

/// Allocates collision-free decorated amounts backed by store reservations.
pub struct AmountDisambiguator {
    store: Arc<dyn PaymentStore>,
    reservation_ttl: Duration,
}

impl AmountDisambiguator {
    /// Create a disambiguator whose reservations live for `reservation_ttl`.
    ///
    /// The TTL must exceed the payment timeout so a reservation can never
    /// lapse while its payment is still live.
    #[must_use]
    pub fn new(store: Arc<dyn PaymentStore>, reservation_ttl: Duration) -> Self {
        Self {
            store,
            reservation_ttl,
        }
    }

    /// Produce a decorated amount for `base` and reserve it on `network`.
    ///
    /// A random non-zero offset at the family's decoration scale (2
    /// decimal places for EVM chains, 6 for account-model chains) is added
    /// on top of the full requested amount and the sum is rounded to that
    /// scale, so the decorated value always exceeds the request. Up to
    /// [`MAX_RESERVE_ATTEMPTS`] random offsets are tried; after that a
    /// timestamp-derived offset is used unconditionally, trading collision
    /// avoidance for guaranteed termination under pathological saturation.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the reservation backend fails.
    pub async fn allocate(
        &self,
        base: Decimal,
        network: &str,
        family: ChainFamily,
    ) -> Result<Decimal> {
        let scale = family.amount_scale();
        let expires_at = Utc::now() + self.reservation_ttl;

        for attempt in 0..MAX_RESERVE_ATTEMPTS {
            let candidate = (base + random_offset(scale)).round_dp(scale);
            if self.store.reserve_amount(candidate, network, expires_at).await? {
                debug!(
                    "Reserved amount {} on {} (attempt {})",
                    candidate,
                    network,
                    attempt + 1
                );
                return Ok(candidate);
            }
        }

        // Saturated: fall back to a timestamp-derived offset. The reserve
        // result is ignored so allocation always terminates.
        let candidate = (base + fallback_offset(scale)).round_dp(scale);
        warn!(
            "Amount space saturated on {}; using fallback amount {}",
            network, candidate
        );
        let _ = self.store.reserve_amount(candidate, network, expires_at).await?;
        Ok(candidate)
    }

    /// Release the reservation for a decorated amount.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the reservation backend fails.
    pub async fn release(&self, amount: Decimal, network: &str) -> Result<()> {
        self.store.release_amount(amount, network).await
    }
}

/// Random non-zero fractional offset at `scale` decimal places.
fn random_offset(scale: u32) -> Decimal {
    let max = 10i64.pow(scale) - 1;
    let units = rand::thread_rng().gen_range(1..=max);
    Decimal::new(units, scale)
}

/// Deterministic offset derived from the current time, non-zero.
fn fallback_offset(scale: u32) -> Decimal {
    let modulus = 10i64.pow(scale) - 1;
    let millis = Utc::now().timestamp_millis();
    Decimal::new(millis.rem_euclid(modulus) + 1, scale)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn disambiguator(store: &Arc<MemoryStore>) -> AmountDisambiguator {
        AmountDisambiguator::new(store.clone() as Arc<dyn PaymentStore>, Duration::hours(24))
    }

    #[tokio::test]
    async fn test_offset_is_added_on_top_of_the_base() {
        let store = Arc::new(MemoryStore::new());
        let amount = disambiguator(&store)
            .allocate(dec!(100.37), "BSC", ChainFamily::Evm)
            .await
            .expect("allocate");

        assert!(amount > dec!(100.37));
        assert!(amount <= dec!(101.36));
    }

    #[tokio::test]
    async fn test_fractional_base_is_never_undercut() {
        // A decorated amount below the request would let the customer
        // underpay, so the offset must never replace the base's fraction.
        for _ in 0..10 {
            let store = Arc::new(MemoryStore::new());
            let amount = disambiguator(&store)
                .allocate(dec!(100.50), "BSC", ChainFamily::Evm)
                .await
                .expect("allocate");

            assert!(
                amount > dec!(100.50),
                "decorated amount {amount} is below the requested 100.50"
            );
        }
    }

    #[tokio::test]
    async fn test_evm_offset_is_two_decimal_places() {
        let store = Arc::new(MemoryStore::new());
        let amount = disambiguator(&store)
            .allocate(dec!(50), "BSC", ChainFamily::Evm)
            .await
            .expect("allocate");

        assert!(amount > dec!(50));
        assert!(amount.normalize().scale() <= 2);
    }

    #[tokio::test]
    async fn test_solana_offset_is_six_decimal_places() {
        let store = Arc::new(MemoryStore::new());
        let amount = disambiguator(&store)
            .allocate(dec!(50), "SOL", ChainFamily::Solana)
            .await
            .expect("allocate");

        assert!(amount.normalize().scale() <= 6);
        assert!(amount.fract() > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_concurrent_allocations_never_collide() {
        let store = Arc::new(MemoryStore::new());
        let d = Arc::new(disambiguator(&store));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let d = d.clone();
            handles.push(tokio::spawn(async move {
                d.allocate(dec!(100), "BSC", ChainFamily::Evm).await
            }));
        }

        let mut amounts = Vec::new();
        for handle in handles {
            amounts.push(handle.await.expect("join").expect("allocate"));
        }

        let mut deduped = amounts.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), amounts.len(), "duplicate amount allocated");
    }

    #[tokio::test]
    async fn test_same_amount_on_different_networks_is_independent() {
        let store = Arc::new(MemoryStore::new());
        let d = disambiguator(&store);

        let amount = d
            .allocate(dec!(100), "BSC", ChainFamily::Evm)
            .await
            .expect("allocate");

        // The identical value is still reservable on another network.
        assert!(store
            .reserve_amount(amount, "ETH", Utc::now() + Duration::hours(1))
            .await
            .expect("reserve"));
    }

    #[tokio::test]
    async fn test_saturation_falls_back_deterministically() {
        let store = Arc::new(MemoryStore::new());
        let expires = Utc::now() + Duration::hours(1);

        // Occupy every EVM candidate for base 7.5.
        for units in 1..100i64 {
            let taken = dec!(7.5) + Decimal::new(units, 2);
            assert!(store
                .reserve_amount(taken, "BSC", expires)
                .await
                .expect("reserve"));
        }

        let amount = disambiguator(&store)
            .allocate(dec!(7.5), "BSC", ChainFamily::Evm)
            .await
            .expect("allocate");

        // Fallback still yields a decorated amount above the base.
        assert!(amount > dec!(7.5));
        assert!(amount <= dec!(8.49));
    }

    #[tokio::test]
    async fn test_release_frees_the_amount() {
        let store = Arc::new(MemoryStore::new());
        let d = disambiguator(&store);

        let amount = d
            .allocate(dec!(10), "ETH", ChainFamily::Evm)
            .await
            .expect("allocate");
        assert!(store.is_amount_reserved(amount, "ETH").await.expect("check"));

        d.release(amount, "ETH").await.expect("release");
        assert!(!store.is_amount_reserved(amount, "ETH").await.expect("check"));
    }
}
