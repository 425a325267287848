//! PostgreSQL ledger store
//!
//! Accounts and transactions live in the tables created by
//! `migrations/0001_ledger.sql`. Each write runs in one database
//! transaction; account updates are guarded by `WHERE version = $expected`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction as DbTransaction};
use uuid::Uuid;

use crate::aggregate::{Account, Kyc, Transaction};
use crate::domain::{AccountType, Balance};

use super::{LedgerStore, StoreError};

const ACCOUNT_COLUMNS: &str = r#"
    id, account_number, owner_id, currency, account_type, balance, status,
    is_primary, kyc_submitted, kyc_approved, verification_date,
    verification_notes, approved_by, fully_activated, interest_rate,
    version, created_at, updated_at
"#;

const TRANSACTION_COLUMNS: &str = r#"
    sequence, id, amount, description, transaction_type, status,
    sender_id, receiver_id, sender_account_id, receiver_account_id, created_at
"#;

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse()
        .map_err(|e: T::Err| StoreError::CorruptRow(format!("{column}: {e}")))
}

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let balance: Decimal = row.try_get("balance")?;

    Ok(Account {
        id: row.try_get("id")?,
        account_number: row.try_get("account_number")?,
        owner_id: row.try_get("owner_id")?,
        currency: parse_column(row, "currency")?,
        account_type: parse_column(row, "account_type")?,
        balance: Balance::new(balance)
            .map_err(|e| StoreError::CorruptRow(format!("balance: {e}")))?,
        status: parse_column(row, "status")?,
        is_primary: row.try_get("is_primary")?,
        kyc: Kyc {
            submitted: row.try_get("kyc_submitted")?,
            approved: row.try_get("kyc_approved")?,
            verification_date: row.try_get("verification_date")?,
            verification_notes: row.try_get("verification_notes")?,
            approved_by: row.try_get("approved_by")?,
            fully_activated: row.try_get("fully_activated")?,
        },
        interest_rate: row.try_get("interest_rate")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction, StoreError> {
    Ok(Transaction {
        id: row.try_get("id")?,
        sequence: row.try_get("sequence")?,
        amount: row.try_get("amount")?,
        description: row.try_get("description")?,
        transaction_type: parse_column(row, "transaction_type")?,
        status: parse_column(row, "status")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        sender_account_id: row.try_get("sender_account_id")?,
        receiver_account_id: row.try_get("receiver_account_id")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Key of an account listing
enum AccountKey<'a> {
    Owner(Uuid),
    Type(&'a AccountType),
}

fn map_unique_violation(err: sqlx::Error, what: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(what),
        _ => StoreError::Database(err),
    }
}

/// Ledger store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Create a new store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write one account version inside `tx`
    async fn update_account(
        tx: &mut DbTransaction<'_, Postgres>,
        account: &Account,
    ) -> Result<(), StoreError> {
        let expected = account.version - 1;

        let rows_affected = sqlx::query(
            r#"
            UPDATE accounts
            SET
                balance = $2,
                status = $3,
                is_primary = $4,
                kyc_submitted = $5,
                kyc_approved = $6,
                verification_date = $7,
                verification_notes = $8,
                approved_by = $9,
                fully_activated = $10,
                interest_rate = $11,
                version = $12,
                updated_at = $13
            WHERE id = $1 AND version = $14
            "#,
        )
        .bind(account.id)
        .bind(account.balance.value())
        .bind(account.status.as_str())
        .bind(account.is_primary)
        .bind(account.kyc.submitted)
        .bind(account.kyc.approved)
        .bind(account.kyc.verification_date)
        .bind(account.kyc.verification_notes.as_deref())
        .bind(account.kyc.approved_by)
        .bind(account.kyc.fully_activated)
        .bind(account.interest_rate)
        .bind(account.version)
        .bind(account.updated_at)
        .bind(expected)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if rows_affected == 1 {
            return Ok(());
        }

        let found: Option<i64> = sqlx::query_scalar("SELECT version FROM accounts WHERE id = $1")
            .bind(account.id)
            .fetch_optional(&mut **tx)
            .await?;

        Err(match found {
            Some(found) => StoreError::VersionConflict {
                account_id: account.id,
                expected,
                found,
            },
            None => StoreError::AccountNotFound(account.id),
        })
    }

    async fn fetch_accounts(
        &self,
        sql: &str,
        key: AccountKey<'_>,
    ) -> Result<Vec<Account>, StoreError> {
        let query = sqlx::query(sql);
        let query = match key {
            AccountKey::Owner(owner_id) => query.bind(owner_id),
            AccountKey::Type(account_type) => query.bind(account_type.as_str()),
        };
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(account_from_row).collect()
    }

    async fn fetch_transactions(
        &self,
        filter: &str,
        id: Uuid,
    ) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE {filter} \
             ORDER BY created_at DESC, sequence DESC"
        );
        let rows = sqlx::query(&sql).bind(id).fetch_all(&self.pool).await?;
        rows.iter().map(transaction_from_row).collect()
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, account_number, owner_id, currency, account_type, balance,
                status, is_primary, kyc_submitted, kyc_approved, verification_date,
                verification_notes, approved_by, fully_activated, interest_rate,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(account.id)
        .bind(&account.account_number)
        .bind(account.owner_id)
        .bind(account.currency.as_str())
        .bind(account.account_type.as_str())
        .bind(account.balance.value())
        .bind(account.status.as_str())
        .bind(account.is_primary)
        .bind(account.kyc.submitted)
        .bind(account.kyc.approved)
        .bind(account.kyc.verification_date)
        .bind(account.kyc.verification_notes.as_deref())
        .bind(account.kyc.approved_by)
        .bind(account.kyc.fully_activated)
        .bind(account.interest_rate)
        .bind(account.version)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                format!(
                    "account {} ({} {} for owner {})",
                    account.account_number, account.currency, account.account_type, account.owner_id
                ),
            )
        })?;

        Ok(())
    }

    async fn account_number_exists(&self, account_number: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE account_number = $1)",
        )
        .bind(account_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_number = $1");
        let row = sqlx::query(&sql)
            .bind(account_number)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StoreError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE owner_id = $1 ORDER BY created_at ASC"
        );
        self.fetch_accounts(&sql, AccountKey::Owner(owner_id)).await
    }

    async fn accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> Result<Vec<Account>, StoreError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_type = $1 ORDER BY created_at ASC"
        );
        self.fetch_accounts(&sql, AccountKey::Type(&account_type)).await
    }

    async fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for account in accounts {
            Self::update_account(&mut tx, account).await?;
        }
        tx.commit().await?;
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

        let mut tx = self.pool.begin().await?;

        for account in accounts {
            Self::update_account(&mut tx, account).await?;
        }

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (
                id, amount, description, transaction_type, status,
                sender_id, receiver_id, sender_account_id, receiver_account_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING sequence
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.amount)
        .bind(&transaction.description)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.status.as_str())
        .bind(transaction.sender_id)
        .bind(transaction.receiver_id)
        .bind(transaction.sender_account_id)
        .bind(transaction.receiver_account_id)
        .bind(transaction.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        transaction.sequence = sequence;
        tracing::debug!(
            transaction_id = %transaction.id,
            sequence,
            "Transaction appended"
        );
        Ok(transaction)
    }

    async fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, StoreError> {
        self.fetch_transactions("sender_id = $1 OR receiver_id = $1", user_id)
            .await
    }

    async fn transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.fetch_transactions(
            "sender_account_id = $1 OR receiver_account_id = $1",
            account_id,
        )
        .await
    }
}
