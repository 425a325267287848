//! Aggregate module
//!
//! The records the ledger owns: accounts and their transaction history.

pub mod account;
pub mod transaction;

pub use account::{Account, Kyc, KycReview};
pub use transaction::Transaction;
