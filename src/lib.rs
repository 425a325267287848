//! retail_ledger Library
//!
//! Accounts, balances and the transaction history of a retail bank, with a
//! two-step authorization workflow in front of customer transfers.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod identifier;
pub mod interest;
pub mod jobs;
pub mod ledger;
pub mod notify;
pub mod query;
pub mod store;
pub mod users;
pub mod workflow;

pub use aggregate::{Account, Transaction};
pub use config::Config;
pub use domain::{Actor, Amount, AmountError, Balance, DomainError, Notification};
pub use error::{AppError, AppResult, ErrorKind};
pub use interest::{InterestAccrualEngine, InterestSchedule};
pub use ledger::Ledger;
pub use query::{TransactionFilter, TransactionQuery};
pub use workflow::{TransferAuthorizationWorkflow, WorkflowConfig};
