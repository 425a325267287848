//! Transaction record
//!
//! An entry of the append-only ledger history. A transaction is built as
//! `pending`, validated against the shape its type requires, and moved to
//! `completed` before being appended together with the balance change it
//! describes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, DomainError, TransactionStatus, TransactionType};

use super::Account;

/// Ledger transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) id: Uuid,
    /// Insertion order assigned by the store; 0 until persisted
    pub(crate) sequence: i64,
    pub(crate) amount: Decimal,
    pub(crate) description: String,
    pub(crate) transaction_type: TransactionType,
    pub(crate) status: TransactionStatus,
    pub(crate) sender_id: Option<Uuid>,
    pub(crate) receiver_id: Option<Uuid>,
    pub(crate) sender_account_id: Option<Uuid>,
    pub(crate) receiver_account_id: Option<Uuid>,
    pub(crate) created_at: DateTime<Utc>,
}

impl Transaction {
    fn pending(
        transaction_type: TransactionType,
        amount: &Amount,
        description: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            amount: amount.value(),
            description,
            transaction_type,
            status: TransactionStatus::Pending,
            sender_id: None,
            receiver_id: None,
            sender_account_id: None,
            receiver_account_id: None,
            created_at: Utc::now(),
        }
    }

    /// Money paid into `account`
    pub fn deposit(account: &Account, amount: &Amount, description: String) -> Self {
        let mut tx = Self::pending(TransactionType::Deposit, amount, description);
        tx.receiver_id = Some(account.owner_id());
        tx.receiver_account_id = Some(account.id());
        tx
    }

    /// Money taken out of `account`
    pub fn withdrawal(account: &Account, amount: &Amount, description: String) -> Self {
        let mut tx = Self::pending(TransactionType::Withdrawal, amount, description);
        tx.sender_id = Some(account.owner_id());
        tx.sender_account_id = Some(account.id());
        tx
    }

    /// Money moved from `sender` to `receiver`
    pub fn transfer(
        sender: &Account,
        receiver: &Account,
        amount: &Amount,
        description: String,
    ) -> Result<Self, DomainError> {
        if sender.id() == receiver.id() {
            return Err(DomainError::SameAccount);
        }
        if sender.currency() != receiver.currency() {
            return Err(DomainError::CurrencyMismatch {
                sender: sender.currency(),
                receiver: receiver.currency(),
            });
        }

        let mut tx = Self::pending(TransactionType::Transfer, amount, description);
        tx.sender_id = Some(sender.owner_id());
        tx.receiver_id = Some(receiver.owner_id());
        tx.sender_account_id = Some(sender.id());
        tx.receiver_account_id = Some(receiver.id());
        Ok(tx)
    }

    /// Interest credited to `account`; the owner is both sender and receiver
    pub fn interest(account: &Account, amount: &Amount, description: String) -> Self {
        let mut tx = Self::pending(TransactionType::Interest, amount, description);
        tx.sender_id = Some(account.owner_id());
        tx.receiver_id = Some(account.owner_id());
        tx.receiver_account_id = Some(account.id());
        tx
    }

    /// Check the account references required by the transaction type.
    ///
    /// Each type is checked on its own.
    pub fn validate(&self) -> Result<(), DomainError> {
        let kind = self.transaction_type;

        if self.amount <= Decimal::ZERO {
            return Err(DomainError::invalid_transaction(kind, "amount must be positive"));
        }

        match kind {
            TransactionType::Deposit | TransactionType::Interest => {
                if self.receiver_account_id.is_none() {
                    return Err(DomainError::invalid_transaction(kind, "missing receiver account"));
                }
                if self.sender_account_id.is_some() {
                    return Err(DomainError::invalid_transaction(
                        kind,
                        "must not reference a sender account",
                    ));
                }
            }
            TransactionType::Withdrawal => {
                if self.sender_account_id.is_none() {
                    return Err(DomainError::invalid_transaction(kind, "missing sender account"));
                }
                if self.receiver_account_id.is_some() {
                    return Err(DomainError::invalid_transaction(
                        kind,
                        "must not reference a receiver account",
                    ));
                }
            }
            TransactionType::Transfer => match (self.sender_account_id, self.receiver_account_id) {
                (Some(sender), Some(receiver)) if sender == receiver => {
                    return Err(DomainError::SameAccount);
                }
                (Some(_), Some(_)) => {}
                _ => {
                    return Err(DomainError::invalid_transaction(
                        kind,
                        "requires both sender and receiver accounts",
                    ));
                }
            },
        }

        Ok(())
    }

    fn transition(mut self, to: TransactionStatus) -> Result<Self, DomainError> {
        if self.status != TransactionStatus::Pending {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(self)
    }

    /// pending → completed
    pub fn completed(self) -> Result<Self, DomainError> {
        self.transition(TransactionStatus::Completed)
    }

    /// pending → failed
    pub fn failed(self) -> Result<Self, DomainError> {
        self.transition(TransactionStatus::Failed)
    }

    /// Whether `user_id` sent or received this transaction
    pub fn involves_user(&self, user_id: Uuid) -> bool {
        self.sender_id == Some(user_id) || self.receiver_id == Some(user_id)
    }

    /// Whether `account_id` is on either side of this transaction
    pub fn involves_account(&self, account_id: Uuid) -> bool {
        self.sender_account_id == Some(account_id) || self.receiver_account_id == Some(account_id)
    }

    /// Signed effect of this transaction on `account_id`'s balance
    pub fn signed_amount_for(&self, account_id: Uuid) -> Decimal {
        if self.status != TransactionStatus::Completed {
            return Decimal::ZERO;
        }
        let mut delta = Decimal::ZERO;
        if self.receiver_account_id == Some(account_id) {
            delta += self.amount;
        }
        if self.sender_account_id == Some(account_id) {
            delta -= self.amount;
        }
        delta
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn sender_id(&self) -> Option<Uuid> {
        self.sender_id
    }

    pub fn receiver_id(&self) -> Option<Uuid> {
        self.receiver_id
    }

    pub fn sender_account_id(&self) -> Option<Uuid> {
        self.sender_account_id
    }

    pub fn receiver_account_id(&self) -> Option<Uuid> {
        self.receiver_account_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
