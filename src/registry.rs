//! Static network and token registry.
//!
//! Holds the supported networks, their token contracts/mints and decimal
//! precision, plus RPC/explorer endpoints. Consulted by the lifecycle
//! manager for validation parameters; has no mutable state.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Which validation/decoding family a network belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    /// EVM-style chains: contract-call token transfers, block confirmations.
    Evm,
    /// Account-model chains (Solana-style): balance deltas, slot confirmations.
    Solana,
}

impl ChainFamily {
    /// Decimal precision used for decorated payment amounts on this family.
    ///
    /// EVM stable-value assets are disambiguated at cent precision; the
    /// smaller Solana unit scale uses micro precision.
    #[must_use]
    pub fn amount_scale(self) -> u32 {
        match self {
            Self::Evm => 2,
            Self::Solana => 6,
        }
    }
}

/// Native currency of a network.
#[derive(Debug, Clone)]
pub struct NativeCurrency {
    /// Display name.
    pub name: &'static str,
    /// Ticker symbol, also accepted as the `token` of a native payment.
    pub symbol: &'static str,
    /// Base-unit decimals.
    pub decimals: u32,
}

/// A token supported on a network.
#[derive(Debug, Clone)]
pub struct TokenSpec {
    /// Mainnet contract/mint address.
    pub address: &'static str,
    /// Testnet contract/mint address.
    pub testnet_address: &'static str,
    /// Token decimals.
    pub decimals: u32,
    /// Ticker symbol.
    pub symbol: &'static str,
}

impl TokenSpec {
    /// Contract/mint address for the selected environment.
    #[must_use]
    pub fn address_for(&self, testnet: bool) -> &'static str {
        if testnet {
            self.testnet_address
        } else {
            self.address
        }
    }
}

/// A supported network.
#[derive(Debug, Clone)]
pub struct NetworkSpec {
    /// Canonical uppercase name (registry key).
    pub name: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Validation/decoding family.
    pub family: ChainFamily,
    /// EVM chain id, if applicable.
    pub chain_id: Option<u64>,
    /// Mainnet RPC endpoint.
    pub rpc_url: &'static str,
    /// Testnet RPC endpoint.
    pub testnet_rpc_url: &'static str,
    /// Mainnet block explorer.
    pub explorer_url: &'static str,
    /// Testnet block explorer.
    pub testnet_explorer_url: &'static str,
    /// Native currency.
    pub native: NativeCurrency,
    /// Supported tokens by symbol.
    pub tokens: BTreeMap<&'static str, TokenSpec>,
}

impl NetworkSpec {
    /// RPC endpoint for the selected environment.
    #[must_use]
    pub fn rpc_url_for(&self, testnet: bool) -> &'static str {
        if testnet {
            self.testnet_rpc_url
        } else {
            self.rpc_url
        }
    }

    /// Explorer URL for the selected environment.
    #[must_use]
    pub fn explorer_url_for(&self, testnet: bool) -> &'static str {
        if testnet {
            self.testnet_explorer_url
        } else {
            self.explorer_url
        }
    }

    /// Whether `token` is this network's native currency symbol.
    #[must_use]
    pub fn is_native(&self, token: &str) -> bool {
        token.eq_ignore_ascii_case(self.native.symbol)
    }

    /// Decimals for a token symbol (native currency included).
    #[must_use]
    pub fn token_decimals(&self, token: &str) -> Option<u32> {
        if self.is_native(token) {
            return Some(self.native.decimals);
        }
        self.tokens
            .get(token.to_uppercase().as_str())
            .map(|t| t.decimals)
    }
}

/// Registry of supported networks and tokens.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: BTreeMap<&'static str, NetworkSpec>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkRegistry {
    /// Build the registry with the built-in network set.
    #[must_use]
    pub fn new() -> Self {
        let mut networks = BTreeMap::new();
        for spec in [bsc(), eth(), sol(), polygon()] {
            networks.insert(spec.name, spec);
        }
        Self { networks }
    }

    /// Look up a network by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNetwork` if the name is not registered.
    pub fn network(&self, name: &str) -> Result<&NetworkSpec> {
        let key = name.to_uppercase();
        self.networks
            .get(key.as_str())
            .ok_or_else(|| Error::UnsupportedNetwork(name.to_string()))
    }

    /// Validate a network/token pair.
    ///
    /// The native currency symbol of a network is always accepted.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNetwork` or `UnsupportedToken`.
    pub fn validate(&self, network: &str, token: &str) -> Result<&NetworkSpec> {
        let spec = self.network(network)?;
        if spec.is_native(token) || spec.tokens.contains_key(token.to_uppercase().as_str()) {
            Ok(spec)
        } else {
            Err(Error::UnsupportedToken {
                network: spec.name.to_string(),
                token: token.to_string(),
            })
        }
    }

    /// Token spec for a network/token pair, `None` for the native currency.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedNetwork` or `UnsupportedToken`.
    pub fn token(&self, network: &str, token: &str) -> Result<Option<&TokenSpec>> {
        let spec = self.validate(network, token)?;
        if spec.is_native(token) {
            Ok(None)
        } else {
            Ok(spec.tokens.get(token.to_uppercase().as_str()))
        }
    }

    /// Names of all supported networks.
    #[must_use]
    pub fn supported_networks(&self) -> Vec<&'static str> {
        self.networks.keys().copied().collect()
    }

    /// Token symbols supported on a network (native currency excluded).
    #[must_use]
    pub fn supported_tokens(&self, network: &str) -> Vec<&'static str> {
        self.network(network)
            .map(|spec| spec.tokens.keys().copied().collect())
            .unwrap_or_default()
    }
}

fn bsc() -> NetworkSpec {
    NetworkSpec {
        name: "BSC",
        display_name: "Binance Smart Chain",
        family: ChainFamily::Evm,
        chain_id: Some(56),
        rpc_url: "https://bsc-dataseed1.binance.org/",
        testnet_rpc_url: "https://data-seed-prebsc-1-s1.binance.org:8545/",
        explorer_url: "https://bscscan.com",
        testnet_explorer_url: "https://testnet.bscscan.com",
        native: NativeCurrency {
            name: "BNB",
            symbol: "BNB",
            decimals: 18,
        },
        tokens: BTreeMap::from([
            (
                "USDT",
                TokenSpec {
                    address: "0x55d398326f99059fF775485246999027B3197955",
                    testnet_address: "0x337610d27c682E347C9cD60BD4b3b107C9d34dDd",
                    decimals: 18,
                    symbol: "USDT",
                },
            ),
            (
                "USDC",
                TokenSpec {
                    address: "0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d",
                    testnet_address: "0x64544969ed7EBf5f083679233325356EbE738930",
                    decimals: 18,
                    symbol: "USDC",
                },
            ),
        ]),
    }
}

fn eth() -> NetworkSpec {
    NetworkSpec {
        name: "ETH",
        display_name: "Ethereum",
        family: ChainFamily::Evm,
        chain_id: Some(1),
        rpc_url: "https://mainnet.infura.io/v3/",
        testnet_rpc_url: "https://sepolia.infura.io/v3/",
        explorer_url: "https://etherscan.io",
        testnet_explorer_url: "https://sepolia.etherscan.io",
        native: NativeCurrency {
            name: "Ethereum",
            symbol: "ETH",
            decimals: 18,
        },
        tokens: BTreeMap::from([
            (
                "USDT",
                TokenSpec {
                    address: "0xdAC17F958D2ee523a2206206994597C13D831ec7",
                    testnet_address: "0x7169D38820dfd117C3FA1f22a697dBA58d90BA06",
                    decimals: 6,
                    symbol: "USDT",
                },
            ),
            (
                "USDC",
                TokenSpec {
                    address: "0xA0b86a33E6441b8435b662303c0f479c7e1d5916",
                    testnet_address: "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238",
                    decimals: 6,
                    symbol: "USDC",
                },
            ),
        ]),
    }
}

fn sol() -> NetworkSpec {
    NetworkSpec {
        name: "SOL",
        display_name: "Solana",
        family: ChainFamily::Solana,
        chain_id: None,
        rpc_url: "https://api.mainnet-beta.solana.com",
        testnet_rpc_url: "https://api.devnet.solana.com",
        explorer_url: "https://explorer.solana.com",
        testnet_explorer_url: "https://explorer.solana.com/?cluster=devnet",
        native: NativeCurrency {
            name: "Solana",
            symbol: "SOL",
            decimals: 9,
        },
        tokens: BTreeMap::from([
            (
                "USDT",
                TokenSpec {
                    address: "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",
                    testnet_address: "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
                    decimals: 6,
                    symbol: "USDT",
                },
            ),
            (
                "USDC",
                TokenSpec {
                    address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                    testnet_address: "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
                    decimals: 6,
                    symbol: "USDC",
                },
            ),
        ]),
    }
}

fn polygon() -> NetworkSpec {
    NetworkSpec {
        name: "POLYGON",
        display_name: "Polygon",
        family: ChainFamily::Evm,
        chain_id: Some(137),
        rpc_url: "https://polygon-rpc.com",
        testnet_rpc_url: "https://rpc-mumbai.maticvigil.com",
        explorer_url: "https://polygonscan.com",
        testnet_explorer_url: "https://mumbai.polygonscan.com",
        native: NativeCurrency {
            name: "Polygon",
            symbol: "MATIC",
            decimals: 18,
        },
        tokens: BTreeMap::from([
            (
                "USDT",
                TokenSpec {
                    address: "0xc2132D05D31c914a87C6611C10748AEb04B58e8F",
                    testnet_address: "0x3813e82e6f7098b9583FC0F33a962D02018B6803",
                    decimals: 6,
                    symbol: "USDT",
                },
            ),
            (
                "USDC",
                TokenSpec {
                    address: "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174",
                    testnet_address: "0xdA5289fCAAF71d52a80A254da614a192b693e977",
                    decimals: 6,
                    symbol: "USDC",
                },
            ),
        ]),
    }
}
