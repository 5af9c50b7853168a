//! Chain-agnostic payment lifecycle manager.
//!
//! One manager serves every configured network; everything chain-specific
//! is reached through the [`ChainAdapter`] trait. The manager owns no
//! payment state of its own and never holds a lock across I/O: lifecycle
//! transitions are pushed down to the store's guarded update, so two
//! concurrent verifications of the same payment resolve to exactly one
//! winner.

use crate::amount::AmountDisambiguator;
use crate::chain::{evm, ChainAdapter, TransferDetails, TxInfo};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::payment::{
    uri, Payment, PaymentFilter, PaymentPage, PaymentStatus, PaymentUpdate, TransactionLogEntry,
};
use crate::registry::NetworkRegistry;
use crate::store::PaymentStore;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Request to create a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentRequest {
    /// Merchant-requested amount, before decoration.
    pub amount: Decimal,
    /// Caller correlation key.
    pub order_id: String,
    /// Target network name.
    pub network: String,
    /// Token symbol (the network's native symbol for native payments).
    pub token: String,
    /// Free-form annotations persisted with the payment.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Payment lifecycle manager.
pub struct PaymentManager {
    config: GatewayConfig,
    registry: NetworkRegistry,
    store: Arc<dyn PaymentStore>,
    chains: HashMap<String, Arc<dyn ChainAdapter>>,
    disambiguator: AmountDisambiguator,
}

impl PaymentManager {
    /// Create a manager over a store and a set of chain adapters keyed by
    /// network name.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        store: Arc<dyn PaymentStore>,
        chains: HashMap<String, Arc<dyn ChainAdapter>>,
    ) -> Self {
        let ttl = Duration::seconds(i64::try_from(config.reservation_ttl_secs).unwrap_or(86_400));
        let disambiguator = AmountDisambiguator::new(store.clone(), ttl);
        let chains = chains
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        Self {
            config,
            registry: NetworkRegistry::new(),
            store,
            chains,
            disambiguator,
        }
    }

    /// The network registry in use.
    #[must_use]
    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Create a payment with a decorated, network-unique amount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a non-positive amount or empty order
    /// id, `UnsupportedNetwork`/`UnsupportedToken` for an unknown pair,
    /// `Config` if no destination wallet is configured, and `Store` on
    /// backend failure.
    pub async fn create_payment(&self, request: CreatePaymentRequest) -> Result<Payment> {
        if request.amount <= Decimal::ZERO {
            return Err(Error::InvalidRequest(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }
        if request.order_id.trim().is_empty() {
            return Err(Error::InvalidRequest("order_id must not be empty".to_string()));
        }

        let spec = self.registry.validate(&request.network, &request.token)?;
        let wallet = self
            .config
            .wallet_for(spec.name)
            .ok_or_else(|| {
                Error::Config(format!("no wallet address configured for {}", spec.name))
            })?
            .to_string();
        let contract_address = self
            .registry
            .token(spec.name, &request.token)?
            .map(|t| t.address_for(self.config.testnet).to_string());

        let amount = self
            .disambiguator
            .allocate(request.amount, spec.name, spec.family)
            .await?;

        let now = Utc::now();
        let timeout = Duration::seconds(
            i64::try_from(self.config.payment_timeout_secs).unwrap_or(1800),
        );
        let payment = Payment {
            id: Uuid::new_v4(),
            original_amount: request.amount,
            amount,
            order_id: request.order_id,
            network: spec.name.to_string(),
            token: request.token.to_uppercase(),
            wallet_address: wallet.clone(),
            contract_address: contract_address.clone(),
            status: PaymentStatus::Pending,
            tx_hash: None,
            confirmations: 0,
            payment_uri: uri::payment_uri(
                spec,
                &wallet,
                contract_address.as_deref(),
                &request.token,
                amount,
            ),
            metadata: request.metadata,
            created_at: now,
            expires_at: now + timeout,
            verified_at: None,
        };

        if let Err(e) = self.store.create_payment(payment.clone()).await {
            // Creation failed after the amount was claimed; free it so the
            // value space does not leak.
            if let Err(release_err) = self.disambiguator.release(amount, spec.name).await {
                warn!("Failed to release amount after create error: {release_err}");
            }
            return Err(e);
        }

        info!(
            "Created payment {} for {} {} on {} (decorated from {})",
            payment.id, payment.amount, payment.token, payment.network, payment.original_amount
        );
        Ok(payment)
    }

    /// Fetch a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` if no such payment exists.
    pub async fn payment(&self, id: Uuid) -> Result<Payment> {
        self.store
            .payment(id)
            .await?
            .ok_or(Error::PaymentNotFound(id))
    }

    /// List payments with pagination.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    pub async fn list_payments(&self, filter: &PaymentFilter) -> Result<PaymentPage> {
        self.store.list_payments(filter).await
    }

    /// Resolve an incoming amount to the live payment expecting it.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNetwork` for an unknown network, `Store` on
    /// backend failure.
    pub async fn find_payment_by_amount(
        &self,
        amount: Decimal,
        network: &str,
    ) -> Result<Option<Payment>> {
        let spec = self.registry.network(network)?;
        self.store.find_payment_by_amount(amount, spec.name).await
    }

    /// Verify a transaction against a payment and advance its lifecycle.
    ///
    /// The transaction must pay the payment's wallet the exact decorated
    /// amount in the expected asset. On success the payment moves to
    /// `confirmed` or `pending_confirmation` depending on the observed
    /// confirmation depth. Verification is single-shot from `pending`;
    /// only a payment sitting in `pending_confirmation` may be verified
    /// again (to pick up new confirmations), and every re-verification
    /// revalidates the transaction in full.
    ///
    /// `network` is an optional caller hint; the payment's own network is
    /// authoritative and a mismatching hint is rejected.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` on a network hint mismatch,
    /// `AlreadyProcessed` if the payment is terminal or a concurrent
    /// verification won, `TransactionNotFound`, `TransactionFailed`, or
    /// `InvalidTransaction` for chain-side mismatches, and `Chain` for
    /// adapter failures or timeouts.
    pub async fn verify_payment(
        &self,
        id: Uuid,
        tx_hash: &str,
        network: Option<&str>,
    ) -> Result<Payment> {
        let payment = self.payment(id).await?;

        if let Some(hint) = network {
            let hinted = self.registry.network(hint)?;
            if hinted.name != payment.network {
                return Err(Error::InvalidRequest(format!(
                    "payment {id} is on {}, not {}",
                    payment.network, hinted.name
                )));
            }
        }

        match payment.status {
            PaymentStatus::Pending => {
                if payment.is_past_expiry(Utc::now()) {
                    // Lazily settle the expiry rather than validate a
                    // transaction for a payment the sweeper will kill.
                    let expired = self.expire_payment(id).await?;
                    return Err(Error::AlreadyProcessed(expired.status));
                }
            }
            PaymentStatus::PendingConfirmation => {
                if let Some(recorded) = &payment.tx_hash {
                    if recorded != tx_hash {
                        return Err(Error::InvalidRequest(format!(
                            "payment {id} is already bound to transaction {recorded}"
                        )));
                    }
                }
            }
            status => return Err(Error::AlreadyProcessed(status)),
        }

        let adapter = self.adapter(&payment.network)?;
        let tx = self
            .with_timeout(adapter.transaction(tx_hash))
            .await?
            .ok_or_else(|| Error::TransactionNotFound(tx_hash.to_string()))?;

        if !tx.succeeded {
            return Err(Error::TransactionFailed(tx_hash.to_string()));
        }
        validate_transfer(&payment, &tx)?;

        let confirmations = self.with_timeout(adapter.confirmations(tx_hash)).await?;
        let new_status = if confirmations >= self.config.min_confirmations {
            PaymentStatus::Confirmed
        } else {
            PaymentStatus::PendingConfirmation
        };

        let update = PaymentUpdate {
            status: Some(new_status),
            tx_hash: Some(tx_hash.to_string()),
            confirmations: Some(confirmations),
            verified_at: Some(Utc::now()),
        };
        // Guarded by the status observed above; a concurrent verification
        // that committed first makes this fail with AlreadyProcessed.
        let updated = self
            .store
            .update_payment(id, &[payment.status], update)
            .await?;

        self.log_verification(&updated, &tx, confirmations).await;

        if updated.status == PaymentStatus::Confirmed {
            self.release_reservation(&updated).await;
            info!(
                "Payment {} confirmed with {} confirmations (tx {})",
                id, confirmations, tx_hash
            );
        } else {
            debug!(
                "Payment {} verified, awaiting confirmations ({}/{})",
                id, confirmations, self.config.min_confirmations
            );
        }

        Ok(updated)
    }

    /// Record an externally reported failure for a non-terminal payment.
    ///
    /// The core never produces `failed` on its own; this is the entry
    /// point for callers that observed a failure out of band.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` or `AlreadyProcessed` if the payment is
    /// already terminal.
    pub async fn report_failure(&self, id: Uuid, reason: &str) -> Result<Payment> {
        let updated = self
            .store
            .update_payment(
                id,
                &[PaymentStatus::Pending, PaymentStatus::PendingConfirmation],
                PaymentUpdate::status(PaymentStatus::Failed),
            )
            .await?;

        self.release_reservation(&updated).await;
        warn!("Payment {id} marked failed: {reason}");
        Ok(updated)
    }

    /// Expire a pending payment whose deadline has passed. Idempotent:
    /// a payment that already reached any terminal state is returned
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound`, or `AlreadyProcessed` if the payment
    /// sits in `pending_confirmation` (a verified payment is never
    /// expired).
    pub async fn expire_payment(&self, id: Uuid) -> Result<Payment> {
        let result = self
            .store
            .update_payment(
                id,
                &[PaymentStatus::Pending],
                PaymentUpdate::status(PaymentStatus::Expired),
            )
            .await;

        match result {
            Ok(updated) => {
                self.release_reservation(&updated).await;
                info!("Payment {id} expired");
                Ok(updated)
            }
            Err(Error::AlreadyProcessed(status)) if status.is_terminal() => {
                self.payment(id).await
            }
            Err(e) => Err(e),
        }
    }

    /// One expiry sweep pass: expire every pending payment past its
    /// deadline. Returns the number of payments expired.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the expirable set cannot be read. Individual
    /// expiry failures are logged and skipped.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let ids = self.store.find_expirable(now).await?;
        let mut expired = 0u64;
        for id in ids {
            match self.expire_payment(id).await {
                Ok(p) if p.status == PaymentStatus::Expired => expired += 1,
                // Lost the race to a verification or another sweeper.
                Ok(p) => debug!("Skipped expiry of {id}, already {}", p.status),
                Err(Error::AlreadyProcessed(status)) => {
                    debug!("Skipped expiry of {id}, already {status}");
                }
                Err(e) => warn!("Failed to expire payment {id}: {e}"),
            }
        }
        if expired > 0 {
            info!("Expiry sweep settled {expired} payment(s)");
        }
        Ok(expired)
    }

    /// Housekeeping pass: drop lapsed reservations and terminal payments
    /// older than the retention window. Returns records removed.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    pub async fn housekeep(&self) -> Result<u64> {
        let retention =
            Duration::days(i64::try_from(self.config.retention_days).unwrap_or(7));
        let removed = self.store.purge_expired(Utc::now(), retention).await?;
        if removed > 0 {
            debug!("Housekeeping removed {removed} stale record(s)");
        }
        Ok(removed)
    }

    /// Balance of the configured receiving wallet for a network/token pair.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNetwork`/`UnsupportedToken`, `Config` if no
    /// wallet or adapter is configured, and `Chain` on adapter failure.
    pub async fn wallet_balance(&self, network: &str, token: &str) -> Result<Decimal> {
        let spec = self.registry.validate(network, token)?;
        let wallet = self.config.wallet_for(spec.name).ok_or_else(|| {
            Error::Config(format!("no wallet address configured for {}", spec.name))
        })?;
        let adapter = self.adapter(spec.name)?;

        match self.registry.token(spec.name, token)? {
            Some(token_spec) => {
                let address = token_spec.address_for(self.config.testnet);
                self.with_timeout(adapter.token_balance(wallet, address)).await
            }
            None => self.with_timeout(adapter.balance(wallet)).await,
        }
    }

    /// Wallet-facing instructions for a payment (exact amount, wallet,
    /// remaining window).
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` or `Store` on backend failure.
    pub async fn payment_instructions(&self, id: Uuid) -> Result<String> {
        let payment = self.payment(id).await?;
        let spec = self.registry.network(&payment.network)?;
        let minutes = i64::try_from(self.config.payment_timeout_secs / 60).unwrap_or(30);
        Ok(uri::payment_instructions(
            spec,
            &payment.token,
            payment.amount,
            &payment.wallet_address,
            minutes,
        ))
    }

    /// Block explorer link for the payment's verified transaction, or
    /// `None` while no transaction is bound.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` or `Store` on backend failure.
    pub async fn explorer_url(&self, id: Uuid) -> Result<Option<String>> {
        let payment = self.payment(id).await?;
        let spec = self.registry.network(&payment.network)?;
        Ok(payment
            .tx_hash
            .as_deref()
            .map(|hash| uri::explorer_tx_url(spec, self.config.testnet, hash)))
    }

    fn adapter(&self, network: &str) -> Result<Arc<dyn ChainAdapter>> {
        self.chains
            .get(&network.to_uppercase())
            .cloned()
            .ok_or_else(|| Error::Config(format!("no chain adapter configured for {network}")))
    }

    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        tokio::time::timeout(self.config.chain_timeout(), fut)
            .await
            .map_err(|_| Error::Chain("chain call timed out".to_string()))?
    }

    async fn log_verification(&self, payment: &Payment, tx: &TxInfo, confirmations: u64) {
        let entry = TransactionLogEntry {
            payment_id: payment.id,
            tx_hash: tx.hash.clone(),
            status: payment.status,
            confirmations,
            block_height: tx.block_height,
            fee_paid: tx.fee.fee_paid,
            fee_price: tx.fee.fee_price,
            logged_at: Utc::now(),
        };
        // Audit logging is best-effort and never blocks the transition.
        if let Err(e) = self.store.append_transaction_log(entry).await {
            warn!("Failed to append transaction log for {}: {e}", payment.id);
        }
    }

    async fn release_reservation(&self, payment: &Payment) {
        if let Err(e) = self
            .disambiguator
            .release(payment.amount, &payment.network)
            .await
        {
            warn!(
                "Failed to release amount {} on {}: {e}",
                payment.amount, payment.network
            );
        }
    }
}

/// Check that a decoded transfer pays this payment exactly.
fn validate_transfer(payment: &Payment, tx: &TxInfo) -> Result<()> {
    match &tx.transfer {
        TransferDetails::Token { contract, to, amount } => {
            let expected_contract = payment.contract_address.as_deref().ok_or_else(|| {
                Error::InvalidTransaction(
                    "token transfer received for a native payment".to_string(),
                )
            })?;
            if !evm::address_eq(contract, expected_contract) {
                return Err(Error::InvalidTransaction(format!(
                    "wrong token contract: expected {expected_contract}, got {contract}"
                )));
            }
            if !evm::address_eq(to, &payment.wallet_address) {
                return Err(Error::InvalidTransaction(format!(
                    "wrong recipient: expected {}, got {to}",
                    payment.wallet_address
                )));
            }
            check_amount(payment.amount, *amount)
        }
        TransferDetails::Native { to, amount } => {
            if payment.contract_address.is_some() {
                return Err(Error::InvalidTransaction(
                    "native transfer received for a token payment".to_string(),
                ));
            }
            if !evm::address_eq(to, &payment.wallet_address) {
                return Err(Error::InvalidTransaction(format!(
                    "wrong recipient: expected {}, got {to}",
                    payment.wallet_address
                )));
            }
            check_amount(payment.amount, *amount)
        }
        TransferDetails::BalanceDelta { owner, mint, amount } => {
            // Account-model addresses are case-sensitive.
            if owner != &payment.wallet_address {
                return Err(Error::InvalidTransaction(format!(
                    "wrong recipient: expected {}, got {owner}",
                    payment.wallet_address
                )));
            }
            if mint.as_deref() != payment.contract_address.as_deref() {
                return Err(Error::InvalidTransaction(format!(
                    "wrong asset: expected {:?}, got {mint:?}",
                    payment.contract_address
                )));
            }
            check_amount(payment.amount, *amount)
        }
        TransferDetails::None => Err(Error::InvalidTransaction(
            "transaction carries no recognizable transfer".to_string(),
        )),
    }
}

fn check_amount(expected: Decimal, received: Decimal) -> Result<()> {
    // Exact decimal equality. Over- and underpayment both fail so the
    // received value can never attribute to the wrong payment.
    if received == expected {
        Ok(())
    } else {
        Err(Error::InvalidTransaction(format!(
            "amount mismatch: expected exactly {expected}, got {received}"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::chain::MockChainAdapter;
    use crate::registry::ChainFamily;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn sandbox_manager() -> (PaymentManager, Arc<MockChainAdapter>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let adapter = Arc::new(MockChainAdapter::new(ChainFamily::Evm));
        let mut chains: HashMap<String, Arc<dyn ChainAdapter>> = HashMap::new();
        chains.insert("BSC".to_string(), adapter.clone());
        let manager =
            PaymentManager::new(GatewayConfig::sandbox(), store.clone(), chains);
        (manager, adapter, store)
    }

    fn usdt_request(amount: Decimal) -> CreatePaymentRequest {
        CreatePaymentRequest {
            amount,
            order_id: "order-1".to_string(),
            network: "BSC".to_string(),
            token: "USDT".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn test_create_payment_decorates_amount() {
        let (manager, _, store) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.original_amount, dec!(100));
        assert!(payment.amount > dec!(100));
        assert!(payment.amount <= dec!(100.99));
        assert!(payment.contract_address.is_some());
        assert!(payment.payment_uri.starts_with("ethereum:"));
        assert!(store
            .is_amount_reserved(payment.amount, "BSC")
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn test_create_with_fractional_amount_never_undercuts() {
        let (manager, _, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100.50)))
            .await
            .expect("create");

        // The expected on-chain value must always exceed the request.
        assert!(payment.amount > dec!(100.50));
        assert!(payment.amount <= dec!(101.49));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_requests() {
        let (manager, _, _) = sandbox_manager();

        let err = manager
            .create_payment(usdt_request(dec!(0)))
            .await
            .expect_err("zero amount");
        assert!(matches!(err, Error::InvalidRequest(_)));

        let mut request = usdt_request(dec!(10));
        request.network = "DOGE".to_string();
        assert!(matches!(
            manager.create_payment(request).await,
            Err(Error::UnsupportedNetwork(_))
        ));

        let mut request = usdt_request(dec!(10));
        request.token = "DAI".to_string();
        assert!(matches!(
            manager.create_payment(request).await,
            Err(Error::UnsupportedToken { .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_confirmed_at_threshold() {
        let (manager, adapter, store) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(50)))
            .await
            .expect("create");

        let tx_hash = adapter.fund_payment(&payment, 18, 3);
        let verified = manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect("verify");

        assert_eq!(verified.status, PaymentStatus::Confirmed);
        assert_eq!(verified.tx_hash.as_deref(), Some(tx_hash.as_str()));
        assert_eq!(verified.confirmations, 3);
        assert!(verified.verified_at.is_some());
        // The amount is released for reuse once terminal.
        assert!(!store
            .is_amount_reserved(payment.amount, "BSC")
            .await
            .expect("check"));
    }

    #[tokio::test]
    async fn test_verify_below_threshold_then_reverify() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(50)))
            .await
            .expect("create");

        let tx_hash = adapter.fund_payment(&payment, 18, 1);
        let verified = manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect("verify");
        assert_eq!(verified.status, PaymentStatus::PendingConfirmation);

        adapter.set_confirmations(&tx_hash, 5);
        let confirmed = manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect("re-verify");
        assert_eq!(confirmed.status, PaymentStatus::Confirmed);
        assert_eq!(confirmed.confirmations, 5);
    }

    #[tokio::test]
    async fn test_reverify_with_different_hash_rejected() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(50)))
            .await
            .expect("create");

        let tx_hash = adapter.fund_payment(&payment, 18, 1);
        manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect("verify");

        let other = adapter.fund_payment(&payment, 18, 5);
        let err = manager
            .verify_payment(payment.id, &other, None)
            .await
            .expect_err("bound to first hash");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_verify_wrong_amount_rejected() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        let contract = payment.contract_address.clone().expect("contract");
        adapter.inject_token_transfer(
            "0xwrong",
            &contract,
            &payment.wallet_address,
            payment.amount + dec!(0.000000000000000001),
            18,
            12,
        );

        let err = manager
            .verify_payment(payment.id, "0xwrong", None)
            .await
            .expect_err("amount mismatch");
        assert!(matches!(err, Error::InvalidTransaction(_)));

        let current = manager.payment(payment.id).await.expect("fetch");
        assert_eq!(current.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_verify_wrong_recipient_rejected() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        let contract = payment.contract_address.clone().expect("contract");
        adapter.inject_token_transfer(
            "0xstray",
            &contract,
            "0x000000000000000000000000000000000000dEaD",
            payment.amount,
            18,
            12,
        );

        assert!(matches!(
            manager.verify_payment(payment.id, "0xstray", None).await,
            Err(Error::InvalidTransaction(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_unknown_and_failed_transactions() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        assert!(matches!(
            manager.verify_payment(payment.id, "0xmissing", None).await,
            Err(Error::TransactionNotFound(_))
        ));

        adapter.inject_failed("0xreverted");
        assert!(matches!(
            manager.verify_payment(payment.id, "0xreverted", None).await,
            Err(Error::TransactionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_after_confirmation_is_already_processed() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        let tx_hash = adapter.fund_payment(&payment, 18, 12);
        manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect("verify");

        let err = manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect_err("terminal");
        assert!(matches!(
            err,
            Error::AlreadyProcessed(PaymentStatus::Confirmed)
        ));
    }

    #[tokio::test]
    async fn test_verify_checks_network_hint() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");
        let tx_hash = adapter.fund_payment(&payment, 18, 12);

        let err = manager
            .verify_payment(payment.id, &tx_hash, Some("ETH"))
            .await
            .expect_err("wrong network hint");
        assert!(matches!(err, Error::InvalidRequest(_)));

        assert!(matches!(
            manager.verify_payment(payment.id, &tx_hash, Some("DOGE")).await,
            Err(Error::UnsupportedNetwork(_))
        ));

        // A matching hint is accepted, case-insensitively.
        let verified = manager
            .verify_payment(payment.id, &tx_hash, Some("bsc"))
            .await
            .expect("verify");
        assert_eq!(verified.status, PaymentStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_instructions_and_explorer_link() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        let instructions = manager
            .payment_instructions(payment.id)
            .await
            .expect("instructions");
        assert!(instructions.contains(&payment.amount.to_string()));
        assert!(instructions.contains(&payment.wallet_address));

        assert!(manager
            .explorer_url(payment.id)
            .await
            .expect("no tx yet")
            .is_none());

        let tx_hash = adapter.fund_payment(&payment, 18, 12);
        manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect("verify");

        let link = manager
            .explorer_url(payment.id)
            .await
            .expect("link")
            .expect("bound");
        assert!(link.contains(&tx_hash));
        // Sandbox runs against testnet explorers.
        assert!(link.starts_with("https://testnet.bscscan.com/tx/"));
    }

    #[tokio::test]
    async fn test_report_failure() {
        let (manager, _, store) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        let failed = manager
            .report_failure(payment.id, "customer cancelled")
            .await
            .expect("fail");
        assert_eq!(failed.status, PaymentStatus::Failed);
        assert!(!store
            .is_amount_reserved(payment.amount, "BSC")
            .await
            .expect("check"));

        // Terminal: cannot fail twice.
        assert!(matches!(
            manager.report_failure(payment.id, "again").await,
            Err(Error::AlreadyProcessed(PaymentStatus::Failed))
        ));
    }

    #[tokio::test]
    async fn test_expire_payment_is_idempotent() {
        let (manager, _, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        let expired = manager.expire_payment(payment.id).await.expect("expire");
        assert_eq!(expired.status, PaymentStatus::Expired);

        let again = manager.expire_payment(payment.id).await.expect("idempotent");
        assert_eq!(again.status, PaymentStatus::Expired);
    }

    #[tokio::test]
    async fn test_expire_is_a_noop_on_other_terminal_states() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");
        let tx_hash = adapter.fund_payment(&payment, 18, 12);
        manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect("verify");

        // Expiry of a confirmed payment returns it unchanged.
        let unchanged = manager.expire_payment(payment.id).await.expect("noop");
        assert_eq!(unchanged.status, PaymentStatus::Confirmed);

        let other = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");
        manager
            .report_failure(other.id, "cancelled")
            .await
            .expect("fail");
        let unchanged = manager.expire_payment(other.id).await.expect("noop");
        assert_eq!(unchanged.status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_expire_does_not_touch_verified_payment() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        let tx_hash = adapter.fund_payment(&payment, 18, 1);
        manager
            .verify_payment(payment.id, &tx_hash, None)
            .await
            .expect("verify");

        assert!(matches!(
            manager.expire_payment(payment.id).await,
            Err(Error::AlreadyProcessed(PaymentStatus::PendingConfirmation))
        ));
    }

    #[tokio::test]
    async fn test_chain_outage_surfaces_as_retryable() {
        let (manager, adapter, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(100)))
            .await
            .expect("create");

        adapter.set_unreachable(true);
        let err = manager
            .verify_payment(payment.id, "0xany", None)
            .await
            .expect_err("outage");
        assert!(err.is_retryable());

        let current = manager.payment(payment.id).await.expect("fetch");
        assert_eq!(current.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_wallet_balance() {
        let (manager, adapter, _) = sandbox_manager();
        let wallet = manager.config().wallet_for("BSC").expect("wallet").to_string();
        adapter.set_balance(&wallet, dec!(3.25));

        assert_eq!(
            manager.wallet_balance("BSC", "BNB").await.expect("balance"),
            dec!(3.25)
        );
    }

    #[tokio::test]
    async fn test_find_payment_by_amount() {
        let (manager, _, _) = sandbox_manager();
        let payment = manager
            .create_payment(usdt_request(dec!(250)))
            .await
            .expect("create");

        let found = manager
            .find_payment_by_amount(payment.amount, "bsc")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.id, payment.id);

        assert!(manager
            .find_payment_by_amount(dec!(0.01), "BSC")
            .await
            .expect("lookup")
            .is_none());
    }
}
