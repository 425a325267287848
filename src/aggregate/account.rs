//! Account Aggregate
//!
//! A bank account with its balance, status, primary flag and KYC state.
//! Every state change returns the next version of the account instead of
//! mutating in place; the store persists it only if the version it replaces
//! is still current.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AccountStatus, AccountType, Amount, AmountError, Balance, Currency, DomainError,
};

/// Know-Your-Customer state of an account
///
/// `fully_activated` is only ever set together with `submitted` and
/// `approved`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kyc {
    pub submitted: bool,
    pub approved: bool,
    pub verification_date: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub fully_activated: bool,
}

/// Outcome requested by a KYC reviewer
#[derive(Debug, Clone, Default)]
pub struct KycReview {
    /// `None` keeps the current submission flag
    pub kyc_submitted: Option<bool>,
    pub kyc_approved: bool,
    pub verification_date: Option<DateTime<Utc>>,
    pub verification_notes: Option<String>,
}

/// Account Aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub(crate) id: Uuid,
    pub(crate) account_number: String,
    pub(crate) owner_id: Uuid,
    pub(crate) currency: Currency,
    pub(crate) account_type: AccountType,
    pub(crate) balance: Balance,
    pub(crate) status: AccountStatus,
    pub(crate) is_primary: bool,
    pub(crate) kyc: Kyc,
    /// Annual rate last applied, as a fraction with 4 decimal places
    pub(crate) interest_rate: Decimal,
    /// Number of persisted states; starts at 1
    pub(crate) version: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

fn amount_error(err: AmountError) -> DomainError {
    DomainError::InvalidAmount(err.to_string())
}

impl Account {
    // =========================================================================
    // Creation
    // =========================================================================

    /// Open a new, inactive account with a zero balance
    pub fn open(
        owner_id: Uuid,
        account_number: String,
        currency: Currency,
        account_type: AccountType,
        is_primary: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_number,
            owner_id,
            currency,
            account_type,
            balance: Balance::zero(),
            status: AccountStatus::Inactive,
            is_primary,
            kyc: Kyc::default(),
            interest_rate: Decimal::new(0, 4),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this account as its next version
    fn next(&self) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next.updated_at = Utc::now();
        next
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.status == AccountStatus::Closed {
            return Err(DomainError::AccountClosed(self.account_number.clone()));
        }
        Ok(())
    }

    // =========================================================================
    // Balance changes
    // =========================================================================

    /// Credit (deposit) money to the account
    pub fn credited(&self, amount: &Amount) -> Result<Account, DomainError> {
        self.ensure_open()?;
        let mut next = self.next();
        next.balance = self.balance.credit(amount).map_err(amount_error)?;
        Ok(next)
    }

    /// Debit (withdraw) money from the account
    pub fn debited(&self, amount: &Amount) -> Result<Account, DomainError> {
        self.ensure_open()?;
        if !self.balance.is_sufficient_for(amount) {
            return Err(DomainError::insufficient_funds(
                amount.value(),
                self.balance.value(),
            ));
        }
        let mut next = self.next();
        next.balance = self.balance.debit(amount).map_err(amount_error)?;
        Ok(next)
    }

    /// Credit accrued interest and record the annual rate it was computed at
    pub fn credited_interest(
        &self,
        interest: &Amount,
        annual_rate: Decimal,
    ) -> Result<Account, DomainError> {
        let mut next = self.credited(interest)?;
        next.interest_rate = annual_rate.round_dp(4);
        Ok(next)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Apply a KYC review.
    ///
    /// Returns the next state and whether this review fully activated the
    /// account.
    pub fn verified(
        &self,
        review: &KycReview,
        approver_id: Uuid,
    ) -> Result<(Account, bool), DomainError> {
        if self.kyc.fully_activated {
            return Err(DomainError::AlreadyActivated(self.account_number.clone()));
        }
        self.ensure_open()?;

        let submitted = review.kyc_submitted.unwrap_or(self.kyc.submitted);
        if review.kyc_approved && !submitted {
            return Err(DomainError::KycNotSubmitted);
        }

        let mut next = self.next();
        next.kyc.submitted = submitted;

        let activated = submitted && review.kyc_approved;
        if activated {
            next.kyc.approved = true;
            next.kyc.verification_date = Some(review.verification_date.unwrap_or_else(Utc::now));
            next.kyc.verification_notes = review.verification_notes.clone();
            next.kyc.approved_by = Some(approver_id);
            next.kyc.fully_activated = true;
            next.status = AccountStatus::Active;
        }

        Ok((next, activated))
    }

    /// Set or clear the primary flag
    pub fn with_primary(&self, is_primary: bool) -> Account {
        let mut next = self.next();
        next.is_primary = is_primary;
        next
    }

    /// Close the account. Only an empty account can be closed.
    pub fn closed(&self) -> Result<Account, DomainError> {
        self.ensure_open()?;
        if !self.balance.is_zero() {
            return Err(DomainError::NonZeroBalance {
                account_number: self.account_number.clone(),
                balance: self.balance.value(),
            });
        }
        let mut next = self.next();
        next.status = AccountStatus::Closed;
        next.is_primary = false;
        Ok(next)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn kyc(&self) -> &Kyc {
        &self.kyc
    }

    /// Fully activated and KYC approved: allowed to send transfers
    pub fn is_verified(&self) -> bool {
        self.kyc.fully_activated && self.kyc.approved
    }

    pub fn interest_rate(&self) -> Decimal {
        self.interest_rate
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
