//! Users
//!
//! The ledger does not own user accounts; it only needs a user's role and
//! security question to authorize transfers. `UserDirectory` is the seam
//! through which the surrounding system supplies them.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::StoreError;

/// Staff and customer roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    AccountExecutive,
    Teller,
    BranchManager,
}

impl Default for Role {
    fn default() -> Self {
        Self::Customer
    }
}

/// Security questions a user can pick at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityQuestion {
    FavoriteColor,
    PetName,
    BirthCity,
    FavoriteSport,
}

impl SecurityQuestion {
    /// Prompt shown to the user
    pub fn prompt(&self) -> &'static str {
        match self {
            SecurityQuestion::FavoriteColor => "What is your favorite color?",
            SecurityQuestion::PetName => "What is the name of your pet?",
            SecurityQuestion::BirthCity => "What city were you born in?",
            SecurityQuestion::FavoriteSport => "What is your favorite sport?",
        }
    }
}

/// SHA-256 hex digest of a secret. Secrets are only ever kept and compared
/// in this form.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// A user as seen by the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub security_question: SecurityQuestion,
    security_answer_hash: String,
}

impl User {
    pub fn new(
        id: Uuid,
        username: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        security_question: SecurityQuestion,
        security_answer: &str,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
            role,
            security_question,
            security_answer_hash: hash_secret(security_answer),
        }
    }

    /// Exact, case-sensitive comparison against the stored answer
    pub fn answer_matches(&self, answer: &str) -> bool {
        hash_secret(answer) == self.security_answer_hash
    }
}

/// Lookup of users by id
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;
}

/// Process-local user directory
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a user
    pub async fn register(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User::new(
            Uuid::new_v4(),
            "alice",
            "alice@example.com",
            Role::Customer,
            SecurityQuestion::PetName,
            "Rex",
        )
    }

    #[test]
    fn test_answer_is_case_sensitive() {
        let user = alice();
        assert!(user.answer_matches("Rex"));
        assert!(!user.answer_matches("rex"));
        assert!(!user.answer_matches("Rex "));
    }

    #[test]
    fn test_answer_not_stored_in_clear() {
        let user = alice();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("\"Rex\""));
        assert!(json.contains(&hash_secret("Rex")));
    }

    #[test]
    fn test_hash_secret_is_hex_sha256() {
        let digest = hash_secret("123456");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_directory_register_and_find() {
        let directory = InMemoryUserDirectory::new();
        let user = alice();
        directory.register(user.clone()).await;

        let found = directory.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
        assert!(directory.find_user(Uuid::new_v4()).await.unwrap().is_none());
    }
}
