//! Transaction history queries
//!
//! Read-side filtering over the transactions a user sent or received.
//! Filters are forgiving: an unparsable date is ignored, and an account the
//! user does not own yields an empty result rather than an error.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Transaction;
use crate::domain::{TransactionStatus, TransactionType};
use crate::error::AppResult;
use crate::store::LedgerStore;

/// Optional filters, as received from the request layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Inclusive lower bound, `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    pub end_date: Option<String>,
    pub account_number: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
}

impl TransactionFilter {
    pub fn between(mut self, start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self.end_date = Some(end_date.into());
        self
    }

    pub fn for_account(mut self, account_number: impl Into<String>) -> Self {
        self.account_number = Some(account_number.into());
        self
    }

    pub fn of_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Date filter value, or `None` if absent or unparsable
fn parse_date(field: &str, value: Option<&str>) -> Option<NaiveDate> {
    let raw = value?.trim();
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::debug!(field, value = raw, "Ignoring unparsable date filter");
            None
        }
    }
}

/// Read-side service over the transaction history
#[derive(Clone)]
pub struct TransactionQuery {
    store: Arc<dyn LedgerStore>,
}

impl TransactionQuery {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Transactions `user_id` sent or received, newest first
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> AppResult<Vec<Transaction>> {
        let account_id = match filter.account_number.as_deref() {
            Some(number) => match self.store.find_account_by_number(number).await? {
                Some(account) if account.owner_id() == user_id => Some(account.id()),
                _ => {
                    tracing::debug!(
                        user_id = %user_id,
                        account_number = number,
                        "Account filter does not match an owned account"
                    );
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        let start = parse_date("start_date", filter.start_date.as_deref());
        let end = parse_date("end_date", filter.end_date.as_deref());

        let mut transactions: Vec<Transaction> = self
            .store
            .transactions_for_user(user_id)
            .await?
            .into_iter()
            .filter(|tx| account_id.map_or(true, |id| tx.involves_account(id)))
            .filter(|tx| {
                let day = tx.created_at().date_naive();
                start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
            })
            .filter(|tx| {
                filter
                    .transaction_type
                    .map_or(true, |t| tx.transaction_type() == t)
            })
            .filter(|tx| filter.status.map_or(true, |s| tx.status() == s))
            .collect();

        // Sequence breaks ties between equal timestamps
        transactions.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.sequence().cmp(&a.sequence()))
        });
        Ok(transactions)
    }
}
