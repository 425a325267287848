//! Transfer authorization workflow
//!
//! A transfer initiated by a customer is committed only after three gates:
//! 1. the sender account belongs to the user and is fully verified
//! 2. the user answers their security question
//! 3. the user returns the one-time passcode sent to them out of band
//!
//! ```text
//! initiate ─► SecurityQuestionPending ─► OtpPending ─► Committed
//!                     │                      │
//!                     └──────► Rejected ◄────┴──► Expired
//! ```

pub mod otp;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::aggregate::Transaction;
use crate::domain::{Amount, DomainError, Notification};
use crate::error::{AppError, AppResult};
use crate::ledger::{required_description, Ledger, TransferCommand};
use crate::notify::{self, Notifier};
use crate::users::{SecurityQuestion, UserDirectory};

pub use otp::{generate_otp, IssuedOtp, OTP_LENGTH};
pub use session::{SessionTable, TransferSession, TransferState};

/// Workflow limits
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Lifetime of an issued passcode (default: 5 minutes)
    pub otp_ttl: Duration,
    /// Lifetime of a whole session from `initiate` (default: 15 minutes)
    pub session_ttl: Duration,
    /// Wrong security answers tolerated per session (default: 3)
    pub max_answer_attempts: u32,
    /// Wrong passcodes tolerated per session (default: 3)
    pub max_otp_attempts: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::seconds(300),
            session_ttl: Duration::seconds(900),
            max_answer_attempts: 3,
            max_otp_attempts: 3,
        }
    }
}

/// Result of a successful `initiate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityChallenge {
    pub question: SecurityQuestion,
    pub prompt: &'static str,
    pub session_expires_at: DateTime<Utc>,
}

/// Result of a correct security answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpChallenge {
    pub otp_expires_at: DateTime<Utc>,
}

/// Per-user transfer authorization state machine
pub struct TransferAuthorizationWorkflow {
    ledger: Arc<Ledger>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    sessions: SessionTable,
    config: WorkflowConfig,
}

/// The user's live session, discarding it if its lifetime is over
fn active_session(
    sessions: &mut HashMap<Uuid, TransferSession>,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<&mut TransferSession> {
    let expired = match sessions.get(&user_id) {
        None => return Err(AppError::SessionNotFound),
        Some(session) => session.is_expired(now),
    };
    if expired {
        sessions.remove(&user_id);
        tracing::info!(
            user_id = %user_id,
            state = %TransferState::Expired,
            "Transfer session expired"
        );
        return Err(AppError::SessionExpired);
    }
    sessions.get_mut(&user_id).ok_or(AppError::SessionNotFound)
}

fn expect_state(session: &TransferSession, expected: TransferState) -> AppResult<()> {
    if session.state != expected {
        return Err(AppError::PreconditionFailed(format!(
            "transfer is {}, expected {}",
            session.state, expected
        )));
    }
    Ok(())
}

impl TransferAuthorizationWorkflow {
    pub fn new(
        ledger: Arc<Ledger>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            ledger,
            users,
            notifier,
            sessions: SessionTable::new(),
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Start a transfer on behalf of `user_id`.
    ///
    /// Replaces any transfer the user already had in progress and returns
    /// the security question to ask.
    pub async fn initiate(
        &self,
        user_id: Uuid,
        mut command: TransferCommand,
    ) -> AppResult<SecurityChallenge> {
        Amount::new(command.amount)?;
        command.description = required_description(&command.description)?;

        let sender = self.ledger.account(&command.sender_account_number).await?;
        if sender.owner_id() != user_id {
            tracing::warn!(
                user_id = %user_id,
                account_number = %sender.account_number(),
                "Transfer initiated from an account the user does not own"
            );
            return Err(AppError::Forbidden(format!(
                "account {} does not belong to user {}",
                sender.account_number(),
                user_id
            )));
        }
        if !sender.is_verified() {
            return Err(AppError::NotVerified(sender.account_number().to_string()));
        }

        let receiver = self.ledger.account(&command.receiver_account_number).await?;
        if receiver.id() == sender.id() {
            return Err(DomainError::SameAccount.into());
        }
        if receiver.currency() != sender.currency() {
            return Err(DomainError::CurrencyMismatch {
                sender: sender.currency(),
                receiver: receiver.currency(),
            }
            .into());
        }

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        let mut session =
            TransferSession::new(user_id, command, Utc::now(), self.config.session_ttl);
        session.state = TransferState::SecurityQuestionPending;
        let session_expires_at = session.expires_at;

        if let Some(previous) = self.sessions.insert(session).await {
            tracing::debug!(
                user_id = %user_id,
                previous_state = %previous.state,
                "Replaced transfer in progress"
            );
        }
        tracing::info!(user_id = %user_id, "Transfer initiated");

        Ok(SecurityChallenge {
            question: user.security_question,
            prompt: user.security_question.prompt(),
            session_expires_at,
        })
    }

    /// Check the security answer and send a one-time passcode
    pub async fn answer_security_question(
        &self,
        user_id: Uuid,
        answer: &str,
    ) -> AppResult<OtpChallenge> {
        // No awaits on collaborators while the session table is locked
        let user = self.users.find_user(user_id).await?;

        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let session = active_session(&mut sessions, user_id, now)?;
        expect_state(session, TransferState::SecurityQuestionPending)?;
        let user = user.ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        if !user.answer_matches(answer) {
            session.answer_attempts += 1;
            let attempts = session.answer_attempts;
            tracing::warn!(user_id = %user_id, attempts, "Wrong security answer");

            if attempts >= self.config.max_answer_attempts {
                sessions.remove(&user_id);
                tracing::warn!(
                    user_id = %user_id,
                    state = %TransferState::Rejected,
                    "Transfer rejected"
                );
                return Err(AppError::TransferRejected(
                    "too many wrong security answers".to_string(),
                ));
            }
            return Err(AppError::WrongAnswer);
        }

        let code = generate_otp();
        let otp_expires_at = now + self.config.otp_ttl;
        session.otp = Some(IssuedOtp::new(&code, otp_expires_at));
        session.state = TransferState::OtpPending;
        drop(sessions);

        notify::dispatch(
            self.notifier.as_ref(),
            Notification::OtpIssued {
                user_id,
                otp: code,
                expires_at: otp_expires_at,
            },
        )
        .await;
        tracing::info!(user_id = %user_id, "Security answer accepted, passcode issued");

        Ok(OtpChallenge { otp_expires_at })
    }

    /// Check the passcode and commit the transfer.
    ///
    /// The session is consumed before the ledger is called, so a passcode
    /// can never be used twice.
    pub async fn submit_otp(&self, user_id: Uuid, otp: &str) -> AppResult<Transaction> {
        let now = Utc::now();
        let command = {
            let mut sessions = self.sessions.lock().await;
            let session = active_session(&mut sessions, user_id, now)?;
            expect_state(session, TransferState::OtpPending)?;

            let issued = session
                .otp
                .clone()
                .ok_or_else(|| AppError::Internal("passcode missing from session".to_string()))?;

            if issued.is_expired(now) {
                sessions.remove(&user_id);
                tracing::info!(
                    user_id = %user_id,
                    state = %TransferState::Expired,
                    "Passcode expired"
                );
                return Err(AppError::InvalidOrExpiredOtp);
            }

            if !issued.matches(otp) {
                session.otp_attempts += 1;
                let attempts = session.otp_attempts;
                tracing::warn!(user_id = %user_id, attempts, "Wrong passcode");

                if attempts >= self.config.max_otp_attempts {
                    sessions.remove(&user_id);
                    tracing::warn!(
                        user_id = %user_id,
                        state = %TransferState::Rejected,
                        "Transfer rejected"
                    );
                    return Err(AppError::TransferRejected(
                        "too many wrong passcodes".to_string(),
                    ));
                }
                return Err(AppError::InvalidOrExpiredOtp);
            }

            let mut session = sessions
                .remove(&user_id)
                .ok_or(AppError::SessionNotFound)?;
            session.state = TransferState::Committed;
            session.command
        };

        match self.ledger.transfer(command).await {
            Ok(transaction) => {
                tracing::info!(
                    user_id = %user_id,
                    transaction_id = %transaction.id(),
                    "Authorized transfer committed"
                );
                Ok(transaction)
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Authorized transfer failed");
                Err(e)
            }
        }
    }

    /// Abandon the user's transfer in progress
    pub async fn cancel(&self, user_id: Uuid) -> AppResult<()> {
        match self.sessions.remove(user_id).await {
            Some(session) => {
                tracing::info!(
                    user_id = %user_id,
                    from = %session.state,
                    state = %TransferState::Rejected,
                    "Transfer cancelled"
                );
                Ok(())
            }
            None => Err(AppError::SessionNotFound),
        }
    }

    /// Current state of the user's transfer, if any.
    ///
    /// An expired session reports `Expired` once and is then discarded.
    pub async fn state(&self, user_id: Uuid) -> Option<TransferState> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get(&user_id)?;
        if session.is_expired(Utc::now()) {
            sessions.remove(&user_id);
            return Some(TransferState::Expired);
        }
        Some(session.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountType, Actor, Currency};
    use crate::error::ErrorKind;
    use crate::identifier::{AccountNumberGenerator, IdentifierConfig};
    use crate::ledger::{DepositCommand, OpenAccountCommand, VerifyAccountCommand};
    use crate::notify::TracingNotifier;
    use crate::store::{InMemoryLedgerStore, StoreError};
    use crate::users::{InMemoryUserDirectory, Role, User};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Directory whose lookups stall once `slow` is set
    struct StallingDirectory {
        inner: Arc<InMemoryUserDirectory>,
        slow: AtomicBool,
    }

    #[async_trait]
    impl UserDirectory for StallingDirectory {
        async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
            if self.slow.load(Ordering::SeqCst) {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
            self.inner.find_user(user_id).await
        }
    }

    struct Fixture {
        workflow: Arc<TransferAuthorizationWorkflow>,
        directory: Arc<StallingDirectory>,
        user: Uuid,
        sender: String,
        receiver: String,
    }

    async fn fixture(config: WorkflowConfig) -> Fixture {
        let ledger = Arc::new(Ledger::new(
            Arc::new(InMemoryLedgerStore::new()),
            AccountNumberGenerator::new(IdentifierConfig::default()).unwrap(),
            Arc::new(TracingNotifier),
            std::time::Duration::from_millis(500),
        ));
        let users = Arc::new(InMemoryUserDirectory::new());
        let user = Uuid::new_v4();
        users
            .register(User::new(
                user,
                "alice",
                "alice@example.com",
                Role::Customer,
                SecurityQuestion::PetName,
                "Rex",
            ))
            .await;

        let sender = ledger
            .open_account(OpenAccountCommand::new(user, Currency::Usd, AccountType::Current))
            .await
            .unwrap();
        let receiver = ledger
            .open_account(OpenAccountCommand::new(
                Uuid::new_v4(),
                Currency::Usd,
                AccountType::Current,
            ))
            .await
            .unwrap();
        ledger
            .verify_account(
                &Actor::new(Uuid::new_v4(), Role::AccountExecutive),
                VerifyAccountCommand::submit_and_approve(sender.id(), Utc::now(), "ID card"),
            )
            .await
            .unwrap();
        ledger
            .deposit(DepositCommand::new(sender.account_number(), dec!(100)))
            .await
            .unwrap();

        let directory = Arc::new(StallingDirectory {
            inner: users,
            slow: AtomicBool::new(false),
        });

        Fixture {
            workflow: Arc::new(TransferAuthorizationWorkflow::new(
                ledger,
                directory.clone(),
                Arc::new(TracingNotifier),
                config,
            )),
            directory,
            user,
            sender: sender.account_number().to_string(),
            receiver: receiver.account_number().to_string(),
        }
    }

    impl Fixture {
        fn command(&self, amount: rust_decimal::Decimal) -> TransferCommand {
            TransferCommand::new(&self.sender, &self.receiver, amount, "rent")
        }
    }

    #[tokio::test]
    async fn test_initiate_returns_question() {
        let f = fixture(WorkflowConfig::default()).await;
        let challenge = f.workflow.initiate(f.user, f.command(dec!(10))).await.unwrap();

        assert_eq!(challenge.question, SecurityQuestion::PetName);
        assert_eq!(
            f.workflow.state(f.user).await,
            Some(TransferState::SecurityQuestionPending)
        );
    }

    #[tokio::test]
    async fn test_initiate_checks_ownership_and_input() {
        let f = fixture(WorkflowConfig::default()).await;

        let err = f
            .workflow
            .initiate(Uuid::new_v4(), f.command(dec!(10)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = f.workflow.initiate(f.user, f.command(dec!(0))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let reversed = TransferCommand::new(&f.receiver, &f.sender, dec!(1), "back");
        let err = f.workflow.initiate(f.user, reversed).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        assert_eq!(f.workflow.state(f.user).await, None);
    }

    #[tokio::test]
    async fn test_steps_out_of_order() {
        let f = fixture(WorkflowConfig::default()).await;

        let err = f.workflow.submit_otp(f.user, "000000").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);

        f.workflow.initiate(f.user, f.command(dec!(10))).await.unwrap();
        let err = f.workflow.submit_otp(f.user, "000000").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }

    #[tokio::test]
    async fn test_answer_attempts_are_capped() {
        let f = fixture(WorkflowConfig {
            max_answer_attempts: 2,
            ..Default::default()
        })
        .await;
        f.workflow.initiate(f.user, f.command(dec!(10))).await.unwrap();

        let err = f.workflow.answer_security_question(f.user, "rex").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongAnswer);

        let err = f.workflow.answer_security_question(f.user, "Max").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);

        let err = f.workflow.answer_security_question(f.user, "Rex").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SessionNotFound);
    }

    #[tokio::test]
    async fn test_session_ttl() {
        let f = fixture(WorkflowConfig {
            session_ttl: Duration::zero(),
            ..Default::default()
        })
        .await;
        f.workflow.initiate(f.user, f.command(dec!(10))).await.unwrap();

        let err = f.workflow.answer_security_question(f.user, "Rex").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expired);
        assert_eq!(f.workflow.state(f.user).await, None);
    }

    #[tokio::test]
    async fn test_cancel() {
        let f = fixture(WorkflowConfig::default()).await;
        f.workflow.initiate(f.user, f.command(dec!(10))).await.unwrap();

        f.workflow.cancel(f.user).await.unwrap();
        assert_eq!(f.workflow.state(f.user).await, None);
        assert_eq!(
            f.workflow.cancel(f.user).await.unwrap_err().kind(),
            ErrorKind::SessionNotFound
        );
    }

    #[tokio::test]
    async fn test_slow_directory_does_not_block_other_sessions() {
        let f = fixture(WorkflowConfig::default()).await;
        f.workflow.initiate(f.user, f.command(dec!(10))).await.unwrap();
        f.directory.slow.store(true, Ordering::SeqCst);

        let workflow = f.workflow.clone();
        let user = f.user;
        let stalled =
            tokio::spawn(async move { workflow.answer_security_question(user, "Rex").await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let bound = std::time::Duration::from_millis(500);
        let other = tokio::time::timeout(bound, f.workflow.state(Uuid::new_v4()))
            .await
            .expect("state() of another user waited on the directory");
        assert_eq!(other, None);

        let own = tokio::time::timeout(bound, f.workflow.state(f.user))
            .await
            .expect("state() waited on the directory");
        assert_eq!(own, Some(TransferState::SecurityQuestionPending));

        tokio::time::timeout(bound, f.workflow.cancel(Uuid::new_v4()))
            .await
            .expect("cancel() waited on the directory")
            .unwrap_err();

        stalled.abort();
    }
}
