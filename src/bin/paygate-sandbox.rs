//! Sandbox driver: runs the real lifecycle manager against the mock
//! chain adapter and an in-memory store, so the full payment flow can be
//! exercised without touching a live network.

use clap::{Parser, Subcommand};
use paygate_core::chain::{ChainAdapter, MockChainAdapter};
use paygate_core::payment::PaymentFilter;
use paygate_core::{
    CreatePaymentRequest, GatewayConfig, NetworkRegistry, PaymentManager, Result,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paygate-sandbox", about = "Simulated payment gateway lifecycle")]
struct Cli {
    /// Log filter (overrides RUST_LOG).
    #[arg(long, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported networks and tokens.
    Networks,
    /// Create a payment, fund it with a simulated transaction, and verify
    /// it through to its final status.
    Pay {
        /// Network name.
        #[arg(long, default_value = "BSC")]
        network: String,
        /// Token symbol.
        #[arg(long, default_value = "USDT")]
        token: String,
        /// Requested amount before decoration.
        #[arg(long, default_value = "100")]
        amount: Decimal,
        /// Merchant order id.
        #[arg(long, default_value = "sandbox-order")]
        order_id: String,
        /// Confirmation depth of the simulated transaction.
        #[arg(long, default_value_t = 12)]
        confirmations: u64,
        /// Simulate a reverted transaction instead of a valid one.
        #[arg(long)]
        fail: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Networks => list_networks(),
        Command::Pay {
            network,
            token,
            amount,
            order_id,
            confirmations,
            fail,
        } => run_payment(&network, &token, amount, order_id, confirmations, fail).await?,
    }

    Ok(())
}

fn list_networks() {
    let registry = NetworkRegistry::new();
    for name in registry.supported_networks() {
        let tokens = registry.supported_tokens(name).join(", ");
        if let Ok(spec) = registry.network(name) {
            println!(
                "{name:<8} {display:<20} native {native}, tokens: {tokens}",
                display = spec.display_name,
                native = spec.native.symbol,
            );
        }
    }
}

async fn run_payment(
    network: &str,
    token: &str,
    amount: Decimal,
    order_id: String,
    confirmations: u64,
    fail: bool,
) -> Result<()> {
    let registry = NetworkRegistry::new();
    let spec = registry.validate(network, token)?;
    let decimals = spec
        .token_decimals(token)
        .unwrap_or(spec.native.decimals);

    let store = Arc::new(paygate_core::MemoryStore::new());
    let adapter = Arc::new(MockChainAdapter::new(spec.family));
    let mut chains: HashMap<String, Arc<dyn ChainAdapter>> = HashMap::new();
    chains.insert(spec.name.to_string(), adapter.clone());
    let manager = PaymentManager::new(GatewayConfig::sandbox(), store, chains);

    let payment = manager
        .create_payment(CreatePaymentRequest {
            amount,
            order_id,
            network: network.to_string(),
            token: token.to_string(),
            metadata: serde_json::Map::new(),
        })
        .await?;
    info!(
        "Awaiting exactly {} {} at {}",
        payment.amount, payment.token, payment.wallet_address
    );
    println!("{}", serde_json::to_string_pretty(&payment).unwrap_or_default());
    println!("{}", manager.payment_instructions(payment.id).await?);

    let tx_hash = if fail {
        adapter.inject_failed("0xdeadbeef");
        "0xdeadbeef".to_string()
    } else {
        adapter.fund_payment(&payment, decimals, confirmations)
    };
    info!("Simulated transaction {tx_hash}");

    match manager.verify_payment(payment.id, &tx_hash, Some(network)).await {
        Ok(verified) => {
            info!("Payment settled as {}", verified.status);
            println!("{}", serde_json::to_string_pretty(&verified).unwrap_or_default());
            if let Some(link) = manager.explorer_url(verified.id).await? {
                println!("Explorer: {link}");
            }
        }
        Err(e) => {
            info!("Verification rejected: {e}");
            let page = manager
                .list_payments(&PaymentFilter::default())
                .await?;
            println!("{}", serde_json::to_string_pretty(&page).unwrap_or_default());
        }
    }

    Ok(())
}
