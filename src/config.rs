//! Configuration for paygate-core.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Seconds until a pending payment expires.
    #[serde(default = "default_payment_timeout")]
    pub payment_timeout_secs: u64,

    /// Confirmation depth at which a verified payment becomes `confirmed`.
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u64,

    /// Seconds a used-amount reservation stays live.
    ///
    /// Intentionally longer than `payment_timeout_secs` so that a late
    /// verification of a purged payment cannot be confused with a new
    /// payment reusing the same amount.
    #[serde(default = "default_reservation_ttl")]
    pub reservation_ttl_secs: u64,

    /// Timeout for individual chain adapter calls.
    #[serde(default = "default_chain_timeout")]
    pub chain_timeout_secs: u64,

    /// Interval between expiry sweep ticks.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Days to retain terminal payments before housekeeping purges them.
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,

    /// Use testnet RPC endpoints and token addresses.
    #[serde(default)]
    pub testnet: bool,

    /// Destination wallet address used when no per-network override exists.
    #[serde(default)]
    pub wallet_address: Option<String>,

    /// Per-network destination wallet overrides, keyed by network name.
    #[serde(default)]
    pub network_wallets: HashMap<String, String>,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            payment_timeout_secs: default_payment_timeout(),
            min_confirmations: default_min_confirmations(),
            reservation_ttl_secs: default_reservation_ttl(),
            chain_timeout_secs: default_chain_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            retention_days: default_retention_days(),
            testnet: false,
            wallet_address: None,
            network_wallets: HashMap::new(),
            log_level: default_log_level(),
        }
    }
}

impl GatewayConfig {
    /// Create a sandbox configuration preset.
    ///
    /// Uses testnet endpoints, a short payment timeout, and a low
    /// confirmation threshold so simulated payments settle quickly.
    #[must_use]
    pub fn sandbox() -> Self {
        Self {
            payment_timeout_secs: 30 * 60,
            min_confirmations: 3,
            reservation_ttl_secs: 60 * 60,
            testnet: true,
            wallet_address: Some("0x742d35Cc6634C0532925a3b8D4C9db96590c0000".to_string()),
            ..Self::default()
        }
    }

    /// Resolve the destination wallet for a network, if configured.
    #[must_use]
    pub fn wallet_for(&self, network: &str) -> Option<&str> {
        self.network_wallets
            .get(&network.to_uppercase())
            .or(self.wallet_address.as_ref())
            .map(String::as_str)
    }

    /// Payment timeout as a [`Duration`].
    #[must_use]
    pub fn payment_timeout(&self) -> Duration {
        Duration::from_secs(self.payment_timeout_secs)
    }

    /// Reservation time-to-live as a [`Duration`].
    #[must_use]
    pub fn reservation_ttl(&self) -> Duration {
        Duration::from_secs(self.reservation_ttl_secs)
    }

    /// Chain call timeout as a [`Duration`].
    #[must_use]
    pub fn chain_timeout(&self) -> Duration {
        Duration::from_secs(self.chain_timeout_secs)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

const fn default_payment_timeout() -> u64 {
    30 * 60
}

const fn default_min_confirmations() -> u64 {
    12
}

const fn default_reservation_ttl() -> u64 {
    24 * 60 * 60
}

const fn default_chain_timeout() -> u64 {
    30
}

const fn default_sweep_interval() -> u64 {
    60
}

const fn default_retention_days() -> u64 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.payment_timeout_secs, 1800);
        assert_eq!(config.min_confirmations, 12);
        assert!(config.reservation_ttl_secs > config.payment_timeout_secs);
        assert!(!config.testnet);
    }

    #[test]
    fn test_sandbox_preset() {
        let config = GatewayConfig::sandbox();
        assert!(config.testnet);
        assert_eq!(config.min_confirmations, 3);
        assert!(config.wallet_address.is_some());
    }

    #[test]
    fn test_wallet_for_prefers_network_override() {
        let mut config = GatewayConfig {
            wallet_address: Some("0xglobal".to_string()),
            ..GatewayConfig::default()
        };
        config
            .network_wallets
            .insert("SOL".to_string(), "SolWallet111".to_string());

        assert_eq!(config.wallet_for("sol"), Some("SolWallet111"));
        assert_eq!(config.wallet_for("BSC"), Some("0xglobal"));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let path = dir.path().join("gateway.toml");

        let config = GatewayConfig::sandbox();
        config.to_file(&path).expect("write config");

        let loaded = GatewayConfig::from_file(&path).expect("read config");
        assert_eq!(loaded.min_confirmations, config.min_confirmations);
        assert_eq!(loaded.wallet_address, config.wallet_address);
        assert!(loaded.testnet);
    }
}
