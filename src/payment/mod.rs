//! Payment lifecycle: data model, manager, expiry sweep, wallet URIs.

pub mod manager;
pub mod sweeper;
pub mod types;
pub mod uri;

pub use manager::{CreatePaymentRequest, PaymentManager};
pub use sweeper::ExpirySweeper;
pub use types::{
    Payment, PaymentFilter, PaymentPage, PaymentStatus, PaymentUpdate, TransactionLogEntry,
};
