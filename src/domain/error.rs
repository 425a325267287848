//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{Currency, TransactionStatus, TransactionType};

/// Domain-specific errors
///
/// These errors represent business rule violations raised by the account and
/// transaction records themselves. They are independent of storage.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Insufficient balance for debit operation
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Decimal,
        available: Decimal,
    },

    /// Invalid amount (zero, negative, sub-cent, or exceeds limit)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account is closed and cannot process transactions
    #[error("Account {0} is closed")]
    AccountClosed(String),

    /// Transfer to same account
    #[error("Cannot transfer to the same account")]
    SameAccount,

    /// Transfer between accounts of different currencies
    #[error("Currency mismatch: sender holds {sender}, receiver holds {receiver}")]
    CurrencyMismatch { sender: Currency, receiver: Currency },

    /// KYC approval requested before KYC was submitted
    #[error("KYC must be submitted before it can be approved")]
    KycNotSubmitted,

    /// Verification requested on an already activated account
    #[error("Account {0} is already fully activated")]
    AlreadyActivated(String),

    /// Account cannot be closed while holding funds
    #[error("Account {account_number} still holds {balance}")]
    NonZeroBalance {
        account_number: String,
        balance: Decimal,
    },

    /// Transaction record violates the shape required by its type
    #[error("Invalid {transaction_type} transaction: {reason}")]
    InvalidTransaction {
        transaction_type: TransactionType,
        reason: String,
    },

    /// Transaction status can only move out of `pending`
    #[error("Transaction status cannot change from {from} to {to}")]
    InvalidStatusTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },
}

impl DomainError {
    /// Create an insufficient funds error
    pub fn insufficient_funds(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    pub fn invalid_transaction(
        transaction_type: TransactionType,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTransaction {
            transaction_type,
            reason: reason.into(),
        }
    }

    /// Check if this is a client error (caller's fault, correctable input)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_) | Self::SameAccount | Self::CurrencyMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_error() {
        let err = DomainError::insufficient_funds(Decimal::new(100, 0), Decimal::new(50, 0));

        assert!(!err.is_client_error());
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));
    }

    #[test]
    fn test_currency_mismatch_message() {
        let err = DomainError::CurrencyMismatch {
            sender: Currency::Usd,
            receiver: Currency::Xaf,
        };

        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Currency mismatch: sender holds usd, receiver holds xaf"
        );
    }

    #[test]
    fn test_invalid_transaction_message() {
        let err = DomainError::invalid_transaction(TransactionType::Deposit, "missing receiver");
        assert_eq!(err.to_string(), "Invalid deposit transaction: missing receiver");
    }
}
