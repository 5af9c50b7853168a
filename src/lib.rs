//! Payment lifecycle engine for a multi-chain crypto payment gateway.
//!
//! All payments on a network share one receiving wallet; incoming
//! transfers are attributed by value alone. The crate mints a unique
//! decorated amount per payment, tracks each payment through a bounded
//! monotonic lifecycle, and validates on-chain transactions against the
//! expected recipient, asset, and exact amount.
//!
//! # Architecture
//!
//! - [`registry`]: static network/token registry (contracts, decimals,
//!   endpoints)
//! - [`store`]: payment store trait with guarded status updates and
//!   atomic amount reservations
//! - [`amount`]: collision-free decorated amount allocation
//! - [`chain`]: chain adapter trait plus per-family decoding helpers and
//!   a mock adapter for sandbox use
//! - [`payment`]: the lifecycle manager, expiry sweeper, and data model
//!
//! One [`payment::PaymentManager`] serves every configured network; the
//! sandbox is the same manager wired to a [`chain::MockChainAdapter`]
//! and an in-memory store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod amount;
pub mod chain;
pub mod config;
pub mod error;
pub mod payment;
pub mod registry;
pub mod store;

pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use payment::{CreatePaymentRequest, ExpirySweeper, Payment, PaymentManager, PaymentStatus};
pub use registry::{ChainFamily, NetworkRegistry};
pub use store::{MemoryStore, PaymentStore};
