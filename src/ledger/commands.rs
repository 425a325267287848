//! Command definitions
//!
//! Commands carry the caller's intent into the ledger. Amounts arrive as raw
//! decimals and are validated by the ledger itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::KycReview;
use crate::domain::{AccountType, Currency};
use crate::error::{AppError, AppResult};

/// Longest accepted transaction description, in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

pub const DEFAULT_DEPOSIT_DESCRIPTION: &str = "Deposit";
pub const DEFAULT_WITHDRAWAL_DESCRIPTION: &str = "Withdrawal";
pub const INTEREST_DESCRIPTION: &str = "Interest";

// =========================================================================
// OpenAccountCommand
// =========================================================================

/// Command to open an account for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAccountCommand {
    pub owner_id: Uuid,
    pub currency: Currency,
    pub account_type: AccountType,
}

impl OpenAccountCommand {
    pub fn new(owner_id: Uuid, currency: Currency, account_type: AccountType) -> Self {
        Self {
            owner_id,
            currency,
            account_type,
        }
    }
}

// =========================================================================
// DepositCommand / WithdrawCommand
// =========================================================================

/// Command to pay money into an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositCommand {
    pub account_number: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

impl DepositCommand {
    pub fn new(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Command to take money out of an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawCommand {
    pub account_number: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

impl WithdrawCommand {
    pub fn new(account_number: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_number: account_number.into(),
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// =========================================================================
// TransferCommand
// =========================================================================

/// Command to move money between two accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCommand {
    pub sender_account_number: String,
    pub receiver_account_number: String,
    pub amount: Decimal,
    pub description: String,
}

impl TransferCommand {
    pub fn new(
        sender_account_number: impl Into<String>,
        receiver_account_number: impl Into<String>,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            sender_account_number: sender_account_number.into(),
            receiver_account_number: receiver_account_number.into(),
            amount,
            description: description.into(),
        }
    }
}

// =========================================================================
// VerifyAccountCommand
// =========================================================================

/// Command to record a KYC review of an account
#[derive(Debug, Clone)]
pub struct VerifyAccountCommand {
    pub account_id: Uuid,
    pub review: KycReview,
}

impl VerifyAccountCommand {
    /// Record that KYC documents were submitted, without approving
    pub fn submitted(account_id: Uuid) -> Self {
        Self {
            account_id,
            review: KycReview {
                kyc_submitted: Some(true),
                ..Default::default()
            },
        }
    }

    /// Approve KYC and fully activate the account
    pub fn approve(
        account_id: Uuid,
        verification_date: DateTime<Utc>,
        verification_notes: impl Into<String>,
    ) -> Self {
        Self {
            account_id,
            review: KycReview {
                kyc_submitted: None,
                kyc_approved: true,
                verification_date: Some(verification_date),
                verification_notes: Some(verification_notes.into()),
            },
        }
    }

    /// Submit and approve in one review
    pub fn submit_and_approve(
        account_id: Uuid,
        verification_date: DateTime<Utc>,
        verification_notes: impl Into<String>,
    ) -> Self {
        let mut command = Self::approve(account_id, verification_date, verification_notes);
        command.review.kyc_submitted = Some(true);
        command
    }
}

// =========================================================================
// Descriptions
// =========================================================================

pub(crate) fn optional_description(
    description: Option<String>,
    default: &str,
) -> AppResult<String> {
    match description {
        Some(d) if !d.trim().is_empty() => required_description(&d),
        _ => Ok(default.to_string()),
    }
}

/// Trimmed transaction description, 1 to 500 characters
pub fn required_description(description: &str) -> AppResult<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::Validation("description is required".to_string()));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(AppError::Validation(format!(
            "description exceeds {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(description.to_string())
}
