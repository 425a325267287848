//! Closed vocabularies of the ledger
//!
//! Currencies, account kinds and statuses, transaction kinds and statuses.
//! Each value has a stable lowercase storage name (`as_str` / `FromStr`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a stored or supplied name is not part of a vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All values, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// Account currency
    Currency ("currency") {
        Usd => "usd",
        Eur => "eur",
        Xaf => "xaf",
    }
}

vocabulary! {
    /// Kind of bank account. Only savings accounts accrue interest.
    AccountType ("account type") {
        Current => "current",
        Savings => "savings",
        Credit => "credit",
        Debit => "debit",
    }
}

vocabulary! {
    /// Account lifecycle status
    AccountStatus ("account status") {
        Active => "active",
        Inactive => "inactive",
        Closed => "closed",
    }
}

vocabulary! {
    TransactionType ("transaction type") {
        Deposit => "deposit",
        Withdrawal => "withdrawal",
        Transfer => "transfer",
        Interest => "interest",
    }
}

vocabulary! {
    TransactionStatus ("transaction status") {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
    }
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self::Inactive
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        Self::Pending
    }
}
