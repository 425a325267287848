//! Common test utilities
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use retail_ledger::aggregate::{Account, Transaction};
use retail_ledger::domain::{AccountType, Actor, Currency, Notification};
use retail_ledger::identifier::{AccountNumberGenerator, IdentifierConfig};
use retail_ledger::ledger::{DepositCommand, OpenAccountCommand, VerifyAccountCommand};
use retail_ledger::notify::{Notifier, NotifyError};
use retail_ledger::store::{InMemoryLedgerStore, LedgerStore, StoreError};
use retail_ledger::users::{InMemoryUserDirectory, Role, SecurityQuestion, User};
use retail_ledger::workflow::{TransferAuthorizationWorkflow, WorkflowConfig};
use retail_ledger::Ledger;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SECURITY_ANSWER: &str = "Rex";

/// Notifier that keeps everything it is handed
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// The most recent passcode issued to `user_id`
    pub async fn last_otp(&self, user_id: Uuid) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|n| match n {
                Notification::OtpIssued { user_id: to, otp, .. } if *to == user_id => {
                    Some(otp.clone())
                }
                _ => None,
            })
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

/// In-memory store whose `commit` can be made to fail
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemoryLedgerStore,
    fail_commits: AtomicBool,
}

impl FaultyStore {
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for FaultyStore {
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.inner.insert_account(account).await
    }

    async fn account_number_exists(&self, account_number: &str) -> Result<bool, StoreError> {
        self.inner.account_number_exists(account_number).await
    }

    async fn find_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        self.inner.find_account(account_id).await
    }

    async fn find_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.inner.find_account_by_number(account_number).await
    }

    async fn accounts_for_owner(&self, owner_id: Uuid) -> Result<Vec<Account>, StoreError> {
        self.inner.accounts_for_owner(owner_id).await
    }

    async fn accounts_by_type(
        &self,
        account_type: AccountType,
    ) -> Result<Vec<Account>, StoreError> {
        self.inner.accounts_by_type(account_type).await
    }

    async fn save_accounts(&self, accounts: &[Account]) -> Result<(), StoreError> {
        self.inner.save_accounts(accounts).await
    }

    async fn commit(
        &self,
        accounts: &[Account],
        transaction: Transaction,
    ) -> Result<Transaction, StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::InvariantViolated("injected failure".to_string()));
        }
        self.inner.commit(accounts, transaction).await
    }

    async fn transactions_for_user(&self, user_id: Uuid) -> Result<Vec<Transaction>, StoreError> {
        self.inner.transactions_for_user(user_id).await
    }

    async fn transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.inner.transactions_for_account(account_id).await
    }
}

/// Ledger over `store` with a recording notifier
pub fn ledger_with(store: Arc<dyn LedgerStore>) -> (Arc<Ledger>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let ledger = Arc::new(Ledger::new(
        store,
        AccountNumberGenerator::new(IdentifierConfig::default()).unwrap(),
        notifier.clone(),
        Duration::from_secs(2),
    ));
    (ledger, notifier)
}

pub fn ledger() -> (Arc<Ledger>, Arc<RecordingNotifier>) {
    ledger_with(Arc::new(InMemoryLedgerStore::new()))
}

pub fn executive() -> Actor {
    Actor::new(Uuid::new_v4(), Role::AccountExecutive)
}

/// Open a verified USD current account for `owner` holding `balance`
pub async fn funded_account(ledger: &Ledger, owner: Uuid, balance: Decimal) -> Account {
    let account = ledger
        .open_account(OpenAccountCommand::new(owner, Currency::Usd, AccountType::Current))
        .await
        .unwrap();
    ledger
        .verify_account(
            &executive(),
            VerifyAccountCommand::submit_and_approve(account.id(), Utc::now(), "passport checked"),
        )
        .await
        .unwrap();
    if !balance.is_zero() {
        ledger
            .deposit(DepositCommand::new(account.account_number(), balance))
            .await
            .unwrap();
    }
    ledger.account(account.account_number()).await.unwrap()
}

/// A registered customer with two funded parties to send between
pub struct TransferFixture {
    pub ledger: Arc<Ledger>,
    pub notifier: Arc<RecordingNotifier>,
    pub workflow: TransferAuthorizationWorkflow,
    pub user_id: Uuid,
    pub sender: String,
    pub receiver: String,
}

pub async fn transfer_fixture(config: WorkflowConfig, balance: Decimal) -> TransferFixture {
    let (ledger, notifier) = ledger();
    let users = Arc::new(InMemoryUserDirectory::new());

    let user_id = Uuid::new_v4();
    users
        .register(User::new(
            user_id,
            "alice",
            "alice@example.com",
            Role::Customer,
            SecurityQuestion::PetName,
            SECURITY_ANSWER,
        ))
        .await;

    let sender = funded_account(&ledger, user_id, balance).await;
    let receiver = funded_account(&ledger, Uuid::new_v4(), Decimal::ZERO).await;

    let workflow =
        TransferAuthorizationWorkflow::new(ledger.clone(), users, notifier.clone(), config);

    TransferFixture {
        ledger,
        notifier,
        workflow,
        user_id,
        sender: sender.account_number().to_string(),
        receiver: receiver.account_number().to_string(),
    }
}
