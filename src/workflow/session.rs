//! Transfer authorization sessions
//!
//! One slot per user. A new session replaces whatever the user had in
//! progress. Expiry is checked when a session is used, never in the
//! background.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::ledger::TransferCommand;

use super::otp::IssuedOtp;

/// Workflow states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferState {
    Initiated,
    SecurityQuestionPending,
    OtpPending,
    Committed,
    Rejected,
    Expired,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Initiated => "initiated",
            TransferState::SecurityQuestionPending => "security_question_pending",
            TransferState::OtpPending => "otp_pending",
            TransferState::Committed => "committed",
            TransferState::Rejected => "rejected",
            TransferState::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Committed | TransferState::Rejected | TransferState::Expired
        )
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-flight transfer awaiting authorization
#[derive(Debug, Clone)]
pub struct TransferSession {
    pub user_id: Uuid,
    pub command: TransferCommand,
    pub state: TransferState,
    pub otp: Option<IssuedOtp>,
    pub answer_attempts: u32,
    pub otp_attempts: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TransferSession {
    pub fn new(user_id: Uuid, command: TransferCommand, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            command,
            state: TransferState::Initiated,
            otp: None,
            answer_attempts: 0,
            otp_attempts: 0,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Sessions keyed by user
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: Mutex<HashMap<Uuid, TransferSession>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access to the table for one workflow step
    pub(crate) async fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, TransferSession>> {
        self.sessions.lock().await
    }

    /// Store `session`, returning the one it replaced
    pub async fn insert(&self, session: TransferSession) -> Option<TransferSession> {
        self.sessions.lock().await.insert(session.user_id, session)
    }

    pub async fn remove(&self, user_id: Uuid) -> Option<TransferSession> {
        self.sessions.lock().await.remove(&user_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
