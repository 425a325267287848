//! Ledger service
//!
//! Owns account balances and the append-only transaction history.
//!
//! Every balance mutation follows the same path:
//! 1. validate the input
//! 2. resolve the account(s) and take their locks in ascending id order
//! 3. reload the locked accounts and apply the domain transition
//! 4. commit the new account versions together with the transaction
//! 5. publish the notification (best-effort)

pub mod commands;
mod locks;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::aggregate::{Account, Transaction};
use crate::domain::{AccountStatus, AccountType, Actor, Amount, DomainError, Notification};
use crate::error::{AppError, AppResult};
use crate::identifier::AccountNumberGenerator;
use crate::interest::InterestSchedule;
use crate::notify::{self, Notifier};
use crate::store::{LedgerStore, StoreError};

use commands::optional_description;
pub use commands::{
    required_description, DepositCommand, OpenAccountCommand, TransferCommand,
    VerifyAccountCommand, WithdrawCommand, DEFAULT_DEPOSIT_DESCRIPTION,
    DEFAULT_WITHDRAWAL_DESCRIPTION, INTEREST_DESCRIPTION, MAX_DESCRIPTION_LENGTH,
};
pub use locks::{LockSet, LockTable, DEFAULT_LOCK_TIMEOUT};

/// Attempts at drawing an unused account number before giving up
pub const MAX_ACCOUNT_NUMBER_ATTEMPTS: usize = 64;

/// Ledger service
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    generator: AccountNumberGenerator,
    notifier: Arc<dyn Notifier>,
    account_locks: LockTable,
    owner_locks: LockTable,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        generator: AccountNumberGenerator,
        notifier: Arc<dyn Notifier>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            store,
            generator,
            notifier,
            account_locks: LockTable::new("account", lock_timeout),
            owner_locks: LockTable::new("owner", lock_timeout),
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Account by its number
    pub async fn account(&self, account_number: &str) -> AppResult<Account> {
        self.store
            .find_account_by_number(account_number)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_number.to_string()))
    }

    /// Account by its internal id
    pub async fn account_by_id(&self, account_id: Uuid) -> AppResult<Account> {
        self.store
            .find_account(account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))
    }

    /// All accounts of `owner_id`, oldest first
    pub async fn accounts_for(&self, owner_id: Uuid) -> AppResult<Vec<Account>> {
        Ok(self.store.accounts_for_owner(owner_id).await?)
    }

    pub async fn accounts_of_type(&self, account_type: AccountType) -> AppResult<Vec<Account>> {
        Ok(self.store.accounts_by_type(account_type).await?)
    }

    // =========================================================================
    // Account lifecycle
    // =========================================================================

    /// Open a new inactive account.
    ///
    /// The account becomes the owner's primary account if it is their first.
    pub async fn open_account(&self, command: OpenAccountCommand) -> AppResult<Account> {
        let _owner_lock = self.owner_locks.acquire_one(command.owner_id).await?;

        let existing = self.store.accounts_for_owner(command.owner_id).await?;
        if existing
            .iter()
            .any(|a| a.currency() == command.currency && a.account_type() == command.account_type)
        {
            return Err(AppError::Conflict(format!(
                "user {} already holds a {} {} account",
                command.owner_id, command.currency, command.account_type
            )));
        }
        let is_primary = existing.is_empty();

        let mut opened = None;
        for attempt in 1..=MAX_ACCOUNT_NUMBER_ATTEMPTS {
            let number = self.generator.generate(command.currency)?;
            if self.store.account_number_exists(&number).await? {
                tracing::debug!(attempt, "Account number collision, regenerating");
                continue;
            }

            let account = Account::open(
                command.owner_id,
                number,
                command.currency,
                command.account_type,
                is_primary,
            );
            match self.store.insert_account(&account).await {
                Ok(()) => {
                    opened = Some(account);
                    break;
                }
                Err(StoreError::Duplicate(what)) => {
                    // Only a number taken concurrently is worth another draw
                    if !self
                        .store
                        .account_number_exists(account.account_number())
                        .await?
                    {
                        return Err(AppError::Conflict(format!("Duplicate {what}")));
                    }
                    tracing::debug!(attempt, "Account number taken concurrently, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let account = opened.ok_or_else(|| {
            AppError::Conflict(format!(
                "no free account number after {} attempts",
                MAX_ACCOUNT_NUMBER_ATTEMPTS
            ))
        })?;

        tracing::info!(
            account_number = %account.account_number(),
            owner_id = %account.owner_id(),
            currency = %account.currency(),
            account_type = %account.account_type(),
            is_primary = account.is_primary(),
            "Account opened"
        );

        notify::dispatch(
            self.notifier.as_ref(),
            Notification::AccountOpened {
                user_id: account.owner_id(),
                account_id: account.id(),
                account_number: account.account_number().to_string(),
                currency: account.currency(),
                account_type: account.account_type(),
                opened_at: account.created_at(),
            },
        )
        .await;

        Ok(account)
    }

    /// Record a KYC review. Only account executives may review.
    pub async fn verify_account(
        &self,
        actor: &Actor,
        command: VerifyAccountCommand,
    ) -> AppResult<Account> {
        if !actor.can_approve() {
            return Err(AppError::Forbidden(format!(
                "user {} may not verify accounts",
                actor.user_id
            )));
        }

        let review = &command.review;
        if review.kyc_approved {
            if review.verification_date.is_none() {
                return Err(AppError::Validation(
                    "verification date is required to approve KYC".to_string(),
                ));
            }
            let has_notes = review
                .verification_notes
                .as_deref()
                .map(|notes| !notes.trim().is_empty())
                .unwrap_or(false);
            if !has_notes {
                return Err(AppError::Validation(
                    "verification notes are required to approve KYC".to_string(),
                ));
            }
        }

        let _lock = self.account_locks.acquire_one(command.account_id).await?;
        let account = self.account_by_id(command.account_id).await?;

        let (next, activated) = account.verified(review, actor.user_id)?;
        self.store.save_accounts(std::slice::from_ref(&next)).await?;

        if activated {
            tracing::info!(
                account_number = %next.account_number(),
                approved_by = %actor.user_id,
                "Account fully activated"
            );
            notify::dispatch(
                self.notifier.as_ref(),
                Notification::AccountActivated {
                    user_id: next.owner_id(),
                    account_id: next.id(),
                    account_number: next.account_number().to_string(),
                    activated_at: next.updated_at(),
                },
            )
            .await;
        } else {
            tracing::info!(
                account_number = %next.account_number(),
                kyc_submitted = next.kyc().submitted,
                "KYC review recorded"
            );
        }

        Ok(next)
    }

    /// Make `account_number` its owner's only primary account
    pub async fn set_primary(&self, actor: &Actor, account_number: &str) -> AppResult<Account> {
        let target = self.account(account_number).await?;
        if !actor.is_owner(target.owner_id()) {
            return Err(AppError::Forbidden(format!(
                "account {} does not belong to user {}",
                account_number, actor.user_id
            )));
        }

        let owner_id = target.owner_id();
        let _owner_lock = self.owner_locks.acquire_one(owner_id).await?;
        let ids: Vec<Uuid> = self
            .store
            .accounts_for_owner(owner_id)
            .await?
            .iter()
            .map(Account::id)
            .collect();
        let _account_locks = self.account_locks.acquire(&ids).await?;

        let accounts = self.store.accounts_for_owner(owner_id).await?;
        let target = accounts
            .iter()
            .find(|a| a.id() == target.id())
            .cloned()
            .ok_or_else(|| AppError::AccountNotFound(account_number.to_string()))?;
        if target.status() == AccountStatus::Closed {
            return Err(DomainError::AccountClosed(account_number.to_string()).into());
        }

        // Demotions first so the store never sees two primaries
        let mut updates: Vec<Account> = accounts
            .iter()
            .filter(|a| a.id() != target.id() && a.is_primary())
            .map(|a| a.with_primary(false))
            .collect();
        let demoted = updates.len();
        let promoted = if target.is_primary() {
            target
        } else {
            let promoted = target.with_primary(true);
            updates.push(promoted.clone());
            promoted
        };

        if !updates.is_empty() {
            self.store.save_accounts(&updates).await?;
            tracing::info!(
                account_number = %promoted.account_number(),
                owner_id = %owner_id,
                demoted,
                "Primary account changed"
            );
        }

        Ok(promoted)
    }

    /// Close an empty account. Allowed for the owner and for approvers.
    pub async fn close_account(&self, actor: &Actor, account_number: &str) -> AppResult<Account> {
        let account = self.account(account_number).await?;
        if !actor.is_owner(account.owner_id()) && !actor.can_approve() {
            return Err(AppError::Forbidden(format!(
                "user {} may not close account {}",
                actor.user_id, account_number
            )));
        }

        let _owner_lock = self.owner_locks.acquire_one(account.owner_id()).await?;
        let _lock = self.account_locks.acquire_one(account.id()).await?;
        let account = self.account_by_id(account.id()).await?;

        let closed = account.closed()?;
        self.store.save_accounts(std::slice::from_ref(&closed)).await?;

        tracing::info!(
            account_number = %closed.account_number(),
            closed_by = %actor.user_id,
            "Account closed"
        );
        Ok(closed)
    }

    // =========================================================================
    // Balance mutations
    // =========================================================================

    /// Pay money into an account
    pub async fn deposit(&self, command: DepositCommand) -> AppResult<Transaction> {
        let amount = Amount::new(command.amount)?;
        let description = optional_description(command.description, DEFAULT_DEPOSIT_DESCRIPTION)?;

        let account = self.account(&command.account_number).await?;
        let _lock = self.account_locks.acquire_one(account.id()).await?;
        let account = self.account_by_id(account.id()).await?;

        let next = account.credited(&amount)?;
        let transaction = Transaction::deposit(&account, &amount, description).completed()?;
        let transaction = self
            .store
            .commit(std::slice::from_ref(&next), transaction)
            .await?;

        tracing::info!(
            account_number = %next.account_number(),
            amount = %amount,
            new_balance = %next.balance(),
            "Deposit completed"
        );
        notify::dispatch(
            self.notifier.as_ref(),
            Notification::DepositCompleted {
                user_id: next.owner_id(),
                account_number: next.account_number().to_string(),
                amount: amount.value(),
                new_balance: next.balance().value(),
            },
        )
        .await;

        Ok(transaction)
    }

    /// Take money out of an account
    pub async fn withdraw(&self, command: WithdrawCommand) -> AppResult<Transaction> {
        let amount = Amount::new(command.amount)?;
        let description =
            optional_description(command.description, DEFAULT_WITHDRAWAL_DESCRIPTION)?;

        let account = self.account(&command.account_number).await?;
        let _lock = self.account_locks.acquire_one(account.id()).await?;
        let account = self.account_by_id(account.id()).await?;

        let next = account.debited(&amount)?;
        let transaction = Transaction::withdrawal(&account, &amount, description).completed()?;
        let transaction = self
            .store
            .commit(std::slice::from_ref(&next), transaction)
            .await?;

        tracing::info!(
            account_number = %next.account_number(),
            amount = %amount,
            new_balance = %next.balance(),
            "Withdrawal completed"
        );
        notify::dispatch(
            self.notifier.as_ref(),
            Notification::WithdrawalCompleted {
                user_id: next.owner_id(),
                account_number: next.account_number().to_string(),
                amount: amount.value(),
                new_balance: next.balance().value(),
            },
        )
        .await;

        Ok(transaction)
    }

    /// Move money between two accounts of the same currency.
    ///
    /// The debit, the credit and the transaction record are committed as one
    /// unit.
    pub async fn transfer(&self, command: TransferCommand) -> AppResult<Transaction> {
        let amount = Amount::new(command.amount)?;
        let description = required_description(&command.description)?;

        let sender = self.account(&command.sender_account_number).await?;
        let receiver = self.account(&command.receiver_account_number).await?;
        if sender.id() == receiver.id() {
            return Err(DomainError::SameAccount.into());
        }

        let _locks = self
            .account_locks
            .acquire(&[sender.id(), receiver.id()])
            .await?;
        let sender = self.account_by_id(sender.id()).await?;
        let receiver = self.account_by_id(receiver.id()).await?;

        let transaction = Transaction::transfer(&sender, &receiver, &amount, description)?;
        let sender_next = sender.debited(&amount)?;
        let receiver_next = receiver.credited(&amount)?;
        let transaction = self
            .store
            .commit(
                &[sender_next.clone(), receiver_next.clone()],
                transaction.completed()?,
            )
            .await?;

        tracing::info!(
            transaction_id = %transaction.id(),
            sender = %sender_next.account_number(),
            receiver = %receiver_next.account_number(),
            amount = %amount,
            "Transfer completed"
        );
        notify::dispatch(
            self.notifier.as_ref(),
            Notification::TransferCompleted {
                sender_user_id: sender_next.owner_id(),
                receiver_user_id: receiver_next.owner_id(),
                sender_account_number: sender_next.account_number().to_string(),
                receiver_account_number: receiver_next.account_number().to_string(),
                amount: amount.value(),
                sender_new_balance: sender_next.balance().value(),
                receiver_new_balance: receiver_next.balance().value(),
            },
        )
        .await;

        Ok(transaction)
    }

    /// Credit one day of interest to a savings account.
    ///
    /// Returns `None` when nothing was credited: the account is not an open
    /// savings account, or the interest rounds to zero.
    pub async fn accrue_interest(
        &self,
        account_number: &str,
        schedule: &InterestSchedule,
    ) -> AppResult<Option<Transaction>> {
        let account = self.account(account_number).await?;
        if account.account_type() != AccountType::Savings {
            return Ok(None);
        }

        let _lock = self.account_locks.acquire_one(account.id()).await?;
        let account = self.account_by_id(account.id()).await?;
        if account.status() == AccountStatus::Closed {
            return Ok(None);
        }

        let (rate, interest) = schedule.daily_interest(account.balance().value());
        if interest.is_zero() {
            tracing::debug!(
                account_number = %account.account_number(),
                "Interest rounds to zero, nothing credited"
            );
            return Ok(None);
        }

        let interest = Amount::new(interest)?;
        let next = account.credited_interest(&interest, rate)?;
        let transaction =
            Transaction::interest(&account, &interest, INTEREST_DESCRIPTION.to_string())
                .completed()?;
        let transaction = self
            .store
            .commit(std::slice::from_ref(&next), transaction)
            .await?;

        tracing::info!(
            account_number = %next.account_number(),
            rate = %rate,
            interest = %interest,
            new_balance = %next.balance(),
            "Interest credited"
        );
        Ok(Some(transaction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use crate::error::ErrorKind;
    use crate::identifier::IdentifierConfig;
    use crate::notify::TracingNotifier;
    use crate::store::InMemoryLedgerStore;
    use crate::users::Role;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn ledger() -> Ledger {
        Ledger::new(
            Arc::new(InMemoryLedgerStore::new()),
            AccountNumberGenerator::new(IdentifierConfig::default()).unwrap(),
            Arc::new(TracingNotifier),
            Duration::from_millis(500),
        )
    }

    fn executive() -> Actor {
        Actor::new(Uuid::new_v4(), Role::AccountExecutive)
    }

    async fn open(ledger: &Ledger, owner: Uuid, currency: Currency, kind: AccountType) -> Account {
        ledger
            .open_account(OpenAccountCommand::new(owner, currency, kind))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_account_is_primary() {
        let ledger = ledger();
        let owner = Uuid::new_v4();

        let first = open(&ledger, owner, Currency::Usd, AccountType::Current).await;
        let second = open(&ledger, owner, Currency::Usd, AccountType::Savings).await;

        assert!(first.is_primary());
        assert!(!second.is_primary());
        assert_eq!(first.status(), AccountStatus::Inactive);
        assert!(crate::identifier::is_valid_account_number(first.account_number()));
    }

    #[tokio::test]
    async fn test_duplicate_slot_conflicts() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        open(&ledger, owner, Currency::Eur, AccountType::Current).await;

        let err = ledger
            .open_account(OpenAccountCommand::new(owner, Currency::Eur, AccountType::Current))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw() {
        let ledger = ledger();
        let account = open(&ledger, Uuid::new_v4(), Currency::Usd, AccountType::Current).await;

        let tx = ledger
            .deposit(DepositCommand::new(account.account_number(), dec!(100)))
            .await
            .unwrap();
        assert_eq!(tx.description(), DEFAULT_DEPOSIT_DESCRIPTION);
        assert!(tx.sequence() > 0);

        ledger
            .withdraw(
                WithdrawCommand::new(account.account_number(), dec!(40))
                    .with_description("ATM"),
            )
            .await
            .unwrap();

        let err = ledger
            .withdraw(WithdrawCommand::new(account.account_number(), dec!(60.01)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

        let now = ledger.account(account.account_number()).await.unwrap();
        assert_eq!(now.balance().value(), dec!(60));
    }

    #[tokio::test]
    async fn test_invalid_amount_is_checked_first() {
        let ledger = ledger();
        let err = ledger
            .deposit(DepositCommand::new("ACCT-X", dec!(-5)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ledger
            .deposit(DepositCommand::new("ACCT-X", dec!(5)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_transfer_rules() {
        let ledger = ledger();
        let a = open(&ledger, Uuid::new_v4(), Currency::Usd, AccountType::Current).await;
        let b = open(&ledger, Uuid::new_v4(), Currency::Usd, AccountType::Current).await;
        let c = open(&ledger, Uuid::new_v4(), Currency::Xaf, AccountType::Current).await;
        ledger
            .deposit(DepositCommand::new(a.account_number(), dec!(50)))
            .await
            .unwrap();

        let same = TransferCommand::new(a.account_number(), a.account_number(), dec!(1), "self");
        assert_eq!(
            ledger.transfer(same).await.unwrap_err().kind(),
            ErrorKind::SameAccount
        );

        let fx = TransferCommand::new(a.account_number(), c.account_number(), dec!(1), "fx");
        assert_eq!(
            ledger.transfer(fx).await.unwrap_err().kind(),
            ErrorKind::CurrencyMismatch
        );

        let blank = TransferCommand::new(a.account_number(), b.account_number(), dec!(1), "  ");
        assert_eq!(
            ledger.transfer(blank).await.unwrap_err().kind(),
            ErrorKind::Validation
        );

        let ok = TransferCommand::new(a.account_number(), b.account_number(), dec!(20), "rent");
        let tx = ledger.transfer(ok).await.unwrap();
        assert_eq!(tx.sender_account_id(), Some(a.id()));
        assert_eq!(tx.receiver_account_id(), Some(b.id()));
        assert_eq!(tx.sender_id(), Some(a.owner_id()));
        assert_eq!(tx.receiver_id(), Some(b.owner_id()));

        assert_eq!(
            ledger.account(a.account_number()).await.unwrap().balance().value(),
            dec!(30)
        );
        assert_eq!(
            ledger.account(b.account_number()).await.unwrap().balance().value(),
            dec!(20)
        );
    }

    #[tokio::test]
    async fn test_verify_requires_executive_and_form() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let account = open(&ledger, owner, Currency::Usd, AccountType::Current).await;

        let err = ledger
            .verify_account(
                &Actor::customer(owner),
                VerifyAccountCommand::submit_and_approve(account.id(), Utc::now(), "ok"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = ledger
            .verify_account(
                &executive(),
                VerifyAccountCommand::submit_and_approve(account.id(), Utc::now(), " "),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ledger
            .verify_account(
                &executive(),
                VerifyAccountCommand::approve(account.id(), Utc::now(), "Passport"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        let verified = ledger
            .verify_account(
                &executive(),
                VerifyAccountCommand::submit_and_approve(account.id(), Utc::now(), "Passport"),
            )
            .await
            .unwrap();
        assert!(verified.is_verified());
        assert_eq!(verified.status(), AccountStatus::Active);

        let again = ledger
            .verify_account(
                &executive(),
                VerifyAccountCommand::submit_and_approve(account.id(), Utc::now(), "Passport"),
            )
            .await
            .unwrap_err();
        assert_eq!(again.kind(), ErrorKind::PreconditionFailed);

        let unchanged = ledger.account_by_id(account.id()).await.unwrap();
        assert_eq!(unchanged.version(), verified.version());
        assert_eq!(unchanged.status(), AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_set_primary_demotes_others() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let first = open(&ledger, owner, Currency::Usd, AccountType::Current).await;
        let second = open(&ledger, owner, Currency::Eur, AccountType::Current).await;

        let err = ledger
            .set_primary(&Actor::customer(Uuid::new_v4()), second.account_number())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let promoted = ledger
            .set_primary(&Actor::customer(owner), second.account_number())
            .await
            .unwrap();
        assert!(promoted.is_primary());

        let accounts = ledger.accounts_for(owner).await.unwrap();
        let primaries: Vec<_> = accounts.iter().filter(|a| a.is_primary()).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id(), second.id());
        assert!(!ledger.account_by_id(first.id()).await.unwrap().is_primary());
    }

    #[tokio::test]
    async fn test_close_account() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let account = open(&ledger, owner, Currency::Usd, AccountType::Current).await;
        ledger
            .deposit(DepositCommand::new(account.account_number(), dec!(5)))
            .await
            .unwrap();

        let err = ledger
            .close_account(&Actor::customer(Uuid::new_v4()), account.account_number())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = ledger
            .close_account(&Actor::customer(owner), account.account_number())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);

        ledger
            .withdraw(WithdrawCommand::new(account.account_number(), dec!(5)))
            .await
            .unwrap();
        let closed = ledger
            .close_account(&Actor::customer(owner), account.account_number())
            .await
            .unwrap();
        assert_eq!(closed.status(), AccountStatus::Closed);

        let err = ledger
            .deposit(DepositCommand::new(account.account_number(), dec!(1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_interest_only_for_savings() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let current = open(&ledger, owner, Currency::Usd, AccountType::Current).await;
        let savings = open(&ledger, owner, Currency::Usd, AccountType::Savings).await;
        for account in [&current, &savings] {
            ledger
                .deposit(DepositCommand::new(account.account_number(), dec!(50000)))
                .await
                .unwrap();
        }

        let schedule = InterestSchedule::default();
        assert!(ledger
            .accrue_interest(current.account_number(), &schedule)
            .await
            .unwrap()
            .is_none());

        let tx = ledger
            .accrue_interest(savings.account_number(), &schedule)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tx.amount(), dec!(0.68));
        assert_eq!(tx.description(), INTEREST_DESCRIPTION);

        let savings = ledger.account(savings.account_number()).await.unwrap();
        assert_eq!(savings.balance().value(), dec!(50000.68));
        assert_eq!(savings.interest_rate(), dec!(0.0050));
    }
}
