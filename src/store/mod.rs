//! Ledger Store module
//!
//! Persistence seam for accounts and the transaction history.
//!
//! Writes are versioned: every account handed to `save_accounts` or `commit`
//! must carry the version directly after the one currently stored. A write
//! whose base version is stale fails as a whole with
//! `StoreError::VersionConflict`, so a balance change and its transaction
//! record are always applied together or not at all.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::{Account, Transaction};
use crate::domain::AccountType;

pub use error::StoreError;
pub use memory::InMemoryLedgerStore;
pub use postgres::PgLedgerStore;

/// Storage of accounts and transactions
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Insert a newly opened account.
    ///
    /// Fails with `StoreError::Duplicate` if the account number or the
    /// (owner, currency, account type) triple is already taken.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn account_number_exists(&self, account_number: &str) -> Result<bool, StoreError>;

    async fn find_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError>;

    async fn accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StoreError>;

    async fn accounts_by_type(&self, account_type: AccountType)
        -> Result<Vec<Account>, StoreError>;

    /// Persist new account versions, in order, all or nothing
    async fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError>;

    /// Persist new account versions and append `transaction`, all or nothing.
    ///
    /// Returns the transaction with its store-assigned sequence.
    async fn commit(
        &self,
        accounts: &[Account],
        transaction: Transaction,
    ) -> Result<Transaction, StoreError>;

    /// Transactions the user sent or received, in no particular order
    async fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, StoreError>;

    /// Transactions touching the account, in no particular order
    async fn transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StoreError>;
}
