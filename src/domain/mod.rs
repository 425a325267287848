//! Domain module
//!
//! Core domain types and business rules.

pub mod amount;
pub mod context;
pub mod error;
pub mod events;
pub mod types;

pub use amount::{Amount, AmountError, Balance};
pub use context::Actor;
pub use error::DomainError;
pub use events::Notification;
pub use types::{
    AccountStatus, AccountType, Currency, TransactionStatus, TransactionType, UnknownVariant,
};
