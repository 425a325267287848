//! Acting user
//!
//! Carries the identity and capabilities of whoever invokes a ledger
//! operation. The request layer resolves roles; the ledger only asks the
//! capability questions below.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::Role;

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// A plain customer
    pub fn customer(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Customer)
    }

    /// Whether this actor may approve KYC and activate accounts
    pub fn can_approve(&self) -> bool {
        matches!(self.role, Role::AccountExecutive)
    }

    /// Whether this actor owns the resource held by `owner_id`
    pub fn is_owner(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}
