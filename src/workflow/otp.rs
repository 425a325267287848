//! One-time passcodes

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::Rng;

use crate::users::hash_secret;

/// Digits in a passcode
pub const OTP_LENGTH: usize = 6;

/// Random numeric passcode, zero-padded to `OTP_LENGTH` digits
pub fn generate_otp() -> String {
    let code: u32 = OsRng.gen_range(0..10u32.pow(OTP_LENGTH as u32));
    format!("{:0width$}", code, width = OTP_LENGTH)
}

/// A passcode as held by a session: digest and expiry only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedOtp {
    digest: String,
    expires_at: DateTime<Utc>,
}

impl IssuedOtp {
    pub fn new(code: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            digest: hash_secret(code),
            expires_at,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Valid strictly before `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Exact comparison against the issued code
    pub fn matches(&self, code: &str) -> bool {
        hash_secret(code) == self.digest
    }
}
