//! Notification events
//!
//! Facts published to the notification layer after a ledger mutation has
//! been durably applied. Delivery is best-effort.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{AccountType, Currency};

/// Outbound notification events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// A new account was opened for a user
    AccountOpened {
        user_id: Uuid,
        account_id: Uuid,
        account_number: String,
        currency: Currency,
        account_type: AccountType,
        opened_at: DateTime<Utc>,
    },

    /// KYC was approved and the account became active
    AccountActivated {
        user_id: Uuid,
        account_id: Uuid,
        account_number: String,
        activated_at: DateTime<Utc>,
    },

    DepositCompleted {
        user_id: Uuid,
        account_number: String,
        amount: Decimal,
        new_balance: Decimal,
    },

    WithdrawalCompleted {
        user_id: Uuid,
        account_number: String,
        amount: Decimal,
        new_balance: Decimal,
    },

    TransferCompleted {
        sender_user_id: Uuid,
        receiver_user_id: Uuid,
        sender_account_number: String,
        receiver_account_number: String,
        amount: Decimal,
        sender_new_balance: Decimal,
        receiver_new_balance: Decimal,
    },

    /// A one-time passcode was issued for a transfer
    OtpIssued {
        user_id: Uuid,
        otp: String,
        expires_at: DateTime<Utc>,
    },
}

impl Notification {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Notification::AccountOpened { .. } => "AccountOpened",
            Notification::AccountActivated { .. } => "AccountActivated",
            Notification::DepositCompleted { .. } => "DepositCompleted",
            Notification::WithdrawalCompleted { .. } => "WithdrawalCompleted",
            Notification::TransferCompleted { .. } => "TransferCompleted",
            Notification::OtpIssued { .. } => "OtpIssued",
        }
    }

    /// The user this notification is addressed to
    pub fn recipient(&self) -> Uuid {
        match self {
            Notification::AccountOpened { user_id, .. } => *user_id,
            Notification::AccountActivated { user_id, .. } => *user_id,
            Notification::DepositCompleted { user_id, .. } => *user_id,
            Notification::WithdrawalCompleted { user_id, .. } => *user_id,
            Notification::TransferCompleted { sender_user_id, .. } => *sender_user_id,
            Notification::OtpIssued { user_id, .. } => *user_id,
        }
    }

    /// Whether the payload carries a secret that must stay out of logs
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Notification::OtpIssued { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_serialization() {
        let event = Notification::DepositCompleted {
            user_id: Uuid::new_v4(),
            account_number: "2899374840123454".to_string(),
            amount: Decimal::new(10000, 2),
            new_balance: Decimal::new(25000, 2),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"DepositCompleted""#));

        let deserialized: Notification = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_otp_is_sensitive() {
        let user_id = Uuid::new_v4();
        let event = Notification::OtpIssued {
            user_id,
            otp: "123456".to_string(),
            expires_at: Utc::now(),
        };

        assert!(event.is_sensitive());
        assert_eq!(event.recipient(), user_id);
        assert_eq!(event.event_type(), "OtpIssued");
    }
}
