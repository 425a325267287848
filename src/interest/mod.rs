//! Interest accrual
//!
//! Savings accounts earn a tiered annual rate chosen by balance bracket.
//! Interest is computed daily as `balance * annual_rate / 365`, rounded half
//! away from zero to the cent, and credited through the ledger like any
//! other balance mutation.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{AccountStatus, AccountType};
use crate::error::AppResult;
use crate::ledger::Ledger;

/// Days per year used for the daily rate
pub const DAYS_PER_YEAR: i64 = 365;

/// Default brackets: `<100k: 0.50%`, `<500k: 1.00%`, `<1M: 1.50%`, `>=1M: 2.00%`
pub const DEFAULT_INTEREST_TIERS: &str = "0:0.0050,100000:0.0100,500000:0.0150,1000000:0.0200";

/// One balance bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterestTier {
    /// Lowest balance (inclusive) earning this rate
    pub min_balance: Decimal,
    /// Annual rate as a fraction, e.g. `0.0050` for 0.50%
    pub annual_rate: Decimal,
}

/// Errors in an interest tier definition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterestError {
    #[error("Interest schedule has no tiers")]
    Empty,

    #[error("Malformed interest tier {0:?}, expected min_balance:annual_rate")]
    Malformed(String),

    #[error("Interest tier {0:?} has a negative bound or a rate outside [0, 1)")]
    OutOfRange(String),

    #[error("Duplicate interest tier starting at {0}")]
    DuplicateBound(Decimal),
}

/// Tiered annual rates, sorted by `min_balance`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestSchedule {
    tiers: Vec<InterestTier>,
}

impl InterestSchedule {
    pub fn new(mut tiers: Vec<InterestTier>) -> Result<Self, InterestError> {
        if tiers.is_empty() {
            return Err(InterestError::Empty);
        }
        for tier in &tiers {
            if tier.min_balance.is_sign_negative()
                || tier.annual_rate.is_sign_negative()
                || tier.annual_rate >= Decimal::ONE
            {
                return Err(InterestError::OutOfRange(format!(
                    "{}:{}",
                    tier.min_balance, tier.annual_rate
                )));
            }
        }

        tiers.sort_by(|a, b| a.min_balance.cmp(&b.min_balance));
        if let Some(pair) = tiers.windows(2).find(|w| w[0].min_balance == w[1].min_balance) {
            return Err(InterestError::DuplicateBound(pair[0].min_balance));
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[InterestTier] {
        &self.tiers
    }

    /// Annual rate of the highest tier whose bound does not exceed `balance`.
    ///
    /// Balances below every bound earn nothing.
    pub fn rate_for(&self, balance: Decimal) -> Decimal {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.min_balance <= balance)
            .map(|tier| tier.annual_rate)
            .unwrap_or(Decimal::ZERO)
    }

    /// One day of interest on `balance`, with the annual rate it used
    pub fn daily_interest(&self, balance: Decimal) -> (Decimal, Decimal) {
        let rate = self.rate_for(balance);
        let interest = (balance * rate / Decimal::from(DAYS_PER_YEAR))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (rate, interest)
    }
}

impl Default for InterestSchedule {
    fn default() -> Self {
        let tier = |min: i64, rate: i64| InterestTier {
            min_balance: Decimal::from(min),
            annual_rate: Decimal::new(rate, 4),
        };
        Self {
            tiers: vec![
                tier(0, 50),
                tier(100_000, 100),
                tier(500_000, 150),
                tier(1_000_000, 200),
            ],
        }
    }
}

impl FromStr for InterestSchedule {
    type Err = InterestError;

    /// Parse `min_balance:annual_rate` pairs separated by commas
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tiers = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (min, rate) = entry
                .split_once(':')
                .ok_or_else(|| InterestError::Malformed(entry.to_string()))?;
            let min_balance = Decimal::from_str(min.trim())
                .map_err(|_| InterestError::Malformed(entry.to_string()))?;
            let annual_rate = Decimal::from_str(rate.trim())
                .map_err(|_| InterestError::Malformed(entry.to_string()))?;
            tiers.push(InterestTier {
                min_balance,
                annual_rate,
            });
        }
        Self::new(tiers)
    }
}

// =========================================================================
// Accrual engine
// =========================================================================

/// Report from one accrual run
#[derive(Debug, Clone, Default)]
pub struct AccrualReport {
    pub accounts_scanned: usize,
    pub accounts_credited: usize,
    pub total_interest: Decimal,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Applies one day of interest to every open savings account
pub struct InterestAccrualEngine {
    ledger: Arc<Ledger>,
    schedule: InterestSchedule,
}

impl InterestAccrualEngine {
    pub fn new(ledger: Arc<Ledger>, schedule: InterestSchedule) -> Self {
        Self { ledger, schedule }
    }

    pub fn schedule(&self) -> &InterestSchedule {
        &self.schedule
    }

    /// Run one accrual cycle.
    ///
    /// A failing account is recorded in the report and does not stop the
    /// run.
    pub async fn run_once(&self) -> AppResult<AccrualReport> {
        let accounts = self.ledger.accounts_of_type(AccountType::Savings).await?;
        let mut report = AccrualReport::default();

        for account in accounts {
            if account.status() == AccountStatus::Closed {
                continue;
            }
            report.accounts_scanned += 1;

            match self
                .ledger
                .accrue_interest(account.account_number(), &self.schedule)
                .await
            {
                Ok(Some(transaction)) => {
                    report.accounts_credited += 1;
                    report.total_interest += transaction.amount();
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        account_number = %account.account_number(),
                        error = %e,
                        "Interest accrual failed"
                    );
                    report
                        .errors
                        .push(format!("{}: {}", account.account_number(), e));
                }
            }
        }

        report.completed_at = Utc::now();
        tracing::info!(
            scanned = report.accounts_scanned,
            credited = report.accounts_credited,
            total_interest = %report.total_interest,
            errors = report.errors.len(),
            "Interest accrual run finished"
        );
        Ok(report)
    }
}
