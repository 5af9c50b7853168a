//! Payment URI construction for wallet deep links and QR codes.
//!
//! EVM networks use EIP-681 `ethereum:` URIs (token payments target the
//! contract's `transfer` function); Solana uses Solana Pay `solana:` URIs.

use crate::chain::evm;
use crate::registry::{ChainFamily, NetworkSpec};
use rust_decimal::Decimal;

/// Build the wallet-facing URI for a payment.
///
/// `contract` is the token contract/mint, `None` for native payments.
/// The amount must already be decorated; its scale never exceeds the
/// asset's decimals.
#[must_use]
pub fn payment_uri(
    spec: &NetworkSpec,
    wallet: &str,
    contract: Option<&str>,
    token: &str,
    amount: Decimal,
) -> String {
    match spec.family {
        ChainFamily::Evm => evm_uri(spec, wallet, contract, token, amount),
        ChainFamily::Solana => solana_uri(wallet, contract, amount),
    }
}

fn evm_uri(
    spec: &NetworkSpec,
    wallet: &str,
    contract: Option<&str>,
    token: &str,
    amount: Decimal,
) -> String {
    let chain_id = spec.chain_id.unwrap_or(1);
    let decimals = spec.token_decimals(token).unwrap_or(18);
    let raw = evm::to_base_units(amount, decimals)
        .map_or_else(|| amount.to_string(), |v| v.to_string());

    match contract {
        Some(contract) => format!(
            "ethereum:{contract}@{chain_id}/transfer?address={wallet}&uint256={raw}"
        ),
        None => format!("ethereum:{wallet}@{chain_id}?value={raw}"),
    }
}

fn solana_uri(wallet: &str, mint: Option<&str>, amount: Decimal) -> String {
    match mint {
        Some(mint) => format!("solana:{wallet}?amount={amount}&spl-token={mint}"),
        None => format!("solana:{wallet}?amount={amount}"),
    }
}

/// Block explorer link for a transaction, environment-aware.
#[must_use]
pub fn explorer_tx_url(spec: &NetworkSpec, testnet: bool, tx_hash: &str) -> String {
    let base = spec.explorer_url_for(testnet);
    match spec.family {
        ChainFamily::Evm => format!("{base}/tx/{tx_hash}"),
        // The Solana explorer carries the cluster in the query string.
        ChainFamily::Solana => match base.split_once('?') {
            Some((host, query)) => format!("{host}tx/{tx_hash}?{query}"),
            None => format!("{base}/tx/{tx_hash}"),
        },
    }
}

/// Human-readable instructions shown alongside the URI.
#[must_use]
pub fn payment_instructions(
    spec: &NetworkSpec,
    token: &str,
    amount: Decimal,
    wallet: &str,
    timeout_minutes: i64,
) -> String {
    format!(
        "Send exactly {amount} {token} on {network} to {wallet} within \
         {timeout_minutes} minutes. The amount must match to the last digit \
         or the payment cannot be attributed.",
        network = spec.display_name,
    )
}
