//! Ledger Store Errors

use uuid::Uuid;

/// Errors that can occur in the ledger store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique key already taken
    #[error("Duplicate {0}")]
    Duplicate(String),

    /// Optimistic concurrency conflict
    #[error("Version conflict for account {account_id}: expected version {expected}, found {found}")]
    VersionConflict {
        account_id: Uuid,
        expected: i64,
        found: i64,
    },

    /// Account to update does not exist
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// A write would break a ledger invariant
    #[error("Invariant violated: {0}")]
    InvariantViolated(String),

    /// Stored row cannot be mapped back to a record
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::Duplicate(_)
        )
    }

    /// Check if retrying the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::Database(_)
        )
    }
}
