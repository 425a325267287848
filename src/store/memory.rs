//! In-memory ledger store
//!
//! Keeps everything behind one lock. Writes are checked in full before any
//! of them is applied, which makes each `commit` atomic.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::aggregate::{Account, Transaction};
use crate::domain::{AccountType, Currency};

use super::{LedgerStore, StoreError};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    by_number: HashMap<String, Uuid>,
    owner_slots: HashSet<(Uuid, Currency, AccountType)>,
    transactions: Vec<Transaction>,
    next_sequence: i64,
}

impl State {
    /// Verify that `accounts` can replace the stored versions
    fn check_versions(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for account in accounts {
            if !seen.insert(account.id) {
                return Err(StoreError::InvariantViolated(format!(
                    "account {} written twice in one commit",
                    account.id
                )));
            }

            let stored = self
                .accounts
                .get(&account.id)
                .ok_or(StoreError::AccountNotFound(account.id))?;

            if stored.version != account.version - 1 {
                return Err(StoreError::VersionConflict {
                    account_id: account.id,
                    expected: account.version - 1,
                    found: stored.version,
                });
            }
            if stored.account_number != account.account_number
                || stored.owner_id != account.owner_id
            {
                return Err(StoreError::InvariantViolated(format!(
                    "identity of account {} cannot change",
                    account.id
                )));
            }
            if account.balance.value().is_sign_negative() {
                return Err(StoreError::InvariantViolated(format!(
                    "negative balance for account {}",
                    account.id
                )));
            }
        }
        Ok(())
    }

    /// Verify that each affected owner keeps at most one primary account
    fn check_primary(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let replaced: HashMap<Uuid, &Account> = accounts.iter().map(|a| (a.id, a)).collect();
        let owners: HashSet<Uuid> = accounts.iter().map(|a| a.owner_id).collect();

        for owner in owners {
            let primaries = self
                .accounts
                .values()
                .filter(|a| a.owner_id == owner)
                .map(|a| replaced.get(&a.id).copied().unwrap_or(a))
                .filter(|a| a.is_primary)
                .count();
            if primaries > 1 {
                return Err(StoreError::InvariantViolated(format!(
                    "owner {owner} would have {primaries} primary accounts"
                )));
            }
        }
        Ok(())
    }

    fn apply(&mut self, accounts: &[Account]) {
        for account in accounts {
            self.accounts.insert(account.id, account.clone());
        }
    }
}

/// Ledger store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        if state.by_number.contains_key(&account.account_number) {
            return Err(StoreError::Duplicate(format!(
                "account number {}",
                account.account_number
            )));
        }
        let slot = (account.owner_id, account.currency, account.account_type);
        if state.owner_slots.contains(&slot) {
            return Err(StoreError::Duplicate(format!(
                "{} {} account for owner {}",
                account.currency, account.account_type, account.owner_id
            )));
        }
        if account.is_primary
            && state
                .accounts
                .values()
                .any(|a| a.owner_id == account.owner_id && a.is_primary)
        {
            return Err(StoreError::InvariantViolated(format!(
                "owner {} already has a primary account",
                account.owner_id
            )));
        }

        state.owner_slots.insert(slot);
        state
            .by_number
            .insert(account.account_number.clone(), account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn account_number_exists(&self, account_number: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().await.by_number.contains_key(account_number))
    }

    async fn find_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.state.read().await.accounts.get(&account_id).cloned())
    }

    async fn find_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .by_number
            .get(account_number)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StoreError> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }

    async fn accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> Result<Vec<Account>, StoreError> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.account_type == account_type)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }

    async fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.check_versions(accounts)?;
        state.check_primary(accounts)?;
        state.apply(accounts);
        Ok(())
    }

    async fn commit(
        &self,
        accounts: &[Account],
        mut transaction: Transaction,
    ) -> Result<Transaction, StoreError> {
        transaction
            .validate()
            .map_err(|e| StoreError::InvariantViolated(e.to_string()))?;

        let mut state = self.state.write().await;
        state.check_versions(accounts)?;
        state.check_primary(accounts)?;

        state.next_sequence += 1;
        transaction.sequence = state.next_sequence;

        state.apply(accounts);
        state.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .filter(|tx| tx.involves_user(user_id))
            .cloned()
            .collect())
    }

    async fn transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .transactions
            .iter()
            .filter(|tx| tx.involves_account(account_id))
            .cloned()
            .collect())
    }
}
