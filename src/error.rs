//! Error handling module
//!
//! Centralized error type returned by the ledger, workflow and query
//! services, and its mapping onto the stable error taxonomy consumed by the
//! request layer.

use serde::Serialize;

use crate::domain::{AmountError, DomainError};
use crate::identifier::IdentifierError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Error kinds reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    NotVerified,
    PreconditionFailed,
    InsufficientFunds,
    CurrencyMismatch,
    SameAccount,
    WrongAnswer,
    InvalidOrExpiredOtp,
    SessionNotFound,
    Expired,
    Rejected,
    Conflict,
    Busy,
    Configuration,
    Internal,
}

impl ErrorKind {
    /// Stable snake_case code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotVerified => "not_verified",
            ErrorKind::PreconditionFailed => "precondition_failed",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::CurrencyMismatch => "currency_mismatch",
            ErrorKind::SameAccount => "same_account",
            ErrorKind::WrongAnswer => "wrong_answer",
            ErrorKind::InvalidOrExpiredOtp => "invalid_or_expired_otp",
            ErrorKind::SessionNotFound => "session_not_found",
            ErrorKind::Expired => "expired",
            ErrorKind::Rejected => "rejected",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Busy => "busy",
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Caller errors
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Account {0} is not verified")]
    NotVerified(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    // Transfer authorization
    #[error("Security answer does not match")]
    WrongAnswer,

    #[error("One-time passcode is invalid or expired")]
    InvalidOrExpiredOtp,

    #[error("No transfer in progress")]
    SessionNotFound,

    #[error("Transfer session expired")]
    SessionExpired,

    #[error("Transfer rejected: {0}")]
    TransferRejected(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Contention
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Busy: {0}")]
    Busy(String),

    // Setup and infrastructure
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if err.is_conflict() {
            AppError::Conflict(err.to_string())
        } else {
            AppError::Store(err)
        }
    }
}

impl From<AmountError> for AppError {
    fn from(err: AmountError) -> Self {
        AppError::Domain(DomainError::InvalidAmount(err.to_string()))
    }
}

impl From<IdentifierError> for AppError {
    fn from(err: IdentifierError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl AppError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::AccountNotFound(_) | AppError::UserNotFound(_) => ErrorKind::NotFound,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::NotVerified(_) => ErrorKind::NotVerified,
            AppError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            AppError::WrongAnswer => ErrorKind::WrongAnswer,
            AppError::InvalidOrExpiredOtp => ErrorKind::InvalidOrExpiredOtp,
            AppError::SessionNotFound => ErrorKind::SessionNotFound,
            AppError::SessionExpired => ErrorKind::Expired,
            AppError::TransferRejected(_) => ErrorKind::Rejected,

            AppError::Domain(domain_err) => match domain_err {
                DomainError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
                DomainError::InvalidAmount(_) => ErrorKind::Validation,
                DomainError::InvalidTransaction { .. } => ErrorKind::Validation,
                DomainError::SameAccount => ErrorKind::SameAccount,
                DomainError::CurrencyMismatch { .. } => ErrorKind::CurrencyMismatch,
                DomainError::AccountClosed(_)
                | DomainError::KycNotSubmitted
                | DomainError::AlreadyActivated(_)
                | DomainError::NonZeroBalance { .. }
                | DomainError::InvalidStatusTransition { .. } => ErrorKind::PreconditionFailed,
            },

            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Busy(_) => ErrorKind::Busy,
            AppError::Configuration(_) => ErrorKind::Configuration,

            AppError::Store(store_err) => match store_err {
                StoreError::AccountNotFound(_) => ErrorKind::NotFound,
                StoreError::InvariantViolated(_) => ErrorKind::Conflict,
                _ => ErrorKind::Internal,
            },
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable code for the request layer
    pub fn error_code(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Check if the caller can correct the request and try again
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Conflict | ErrorKind::Busy | ErrorKind::Configuration | ErrorKind::Internal
        )
    }

    /// Check if the same request may succeed when retried later
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict | ErrorKind::Busy)
    }
}
