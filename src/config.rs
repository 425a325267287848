//! Configuration module
//!
//! Loads configuration from environment variables. Every setting has a
//! default except the database URL: outside production its absence selects
//! the in-memory store.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::Currency;
use crate::identifier::{IdentifierConfig, DEFAULT_ACCOUNT_NUMBER_LENGTH};
use crate::interest::{InterestSchedule, DEFAULT_INTEREST_TIERS};
use crate::jobs::JobSchedulerConfig;
use crate::workflow::WorkflowConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL; `None` runs on the in-memory store
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Environment (development, production)
    pub environment: String,

    /// Bank, branch and currency codes for account numbers
    pub identifier: IdentifierConfig,

    /// Transfer authorization limits. The daemon only reports them; the
    /// request layer embedding `TransferAuthorizationWorkflow` consumes them.
    pub workflow: WorkflowConfig,

    /// Bound on a single account lock acquisition
    pub lock_timeout: Duration,

    /// Tiered savings rates
    pub interest: InterestSchedule,

    pub jobs: JobSchedulerConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &'static str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let environment = var("ENVIRONMENT", "development");

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        if database_url.is_none() && environment == "production" {
            return Err(ConfigError::MissingEnv("DATABASE_URL"));
        }

        let database_max_connections = parse(
            var("DATABASE_MAX_CONNECTIONS", "10"),
            "DATABASE_MAX_CONNECTIONS",
        )?;

        let identifier = IdentifierConfig {
            bank_code: var("BANK_CODE", "289"),
            branch_code: var("BANK_BRANCH_CODE", "9374"),
            currency_codes: HashMap::from([
                (Currency::Usd, var("CURRENCY_CODE_USD", "840")),
                (Currency::Eur, var("CURRENCY_CODE_EUR", "978")),
                (Currency::Xaf, var("CURRENCY_CODE_XAF", "950")),
            ]),
            length: parse(
                var("ACCOUNT_NUMBER_LENGTH", &DEFAULT_ACCOUNT_NUMBER_LENGTH.to_string()),
                "ACCOUNT_NUMBER_LENGTH",
            )?,
        };

        let otp_secs: i64 = parse(var("OTP_EXPIRATION_SECONDS", "300"), "OTP_EXPIRATION_SECONDS")?;
        let session_secs: i64 = parse(
            var("TRANSFER_SESSION_TTL_SECONDS", "900"),
            "TRANSFER_SESSION_TTL_SECONDS",
        )?;
        if otp_secs <= 0 {
            return Err(ConfigError::InvalidValue("OTP_EXPIRATION_SECONDS"));
        }
        if session_secs <= 0 {
            return Err(ConfigError::InvalidValue("TRANSFER_SESSION_TTL_SECONDS"));
        }
        let workflow = WorkflowConfig {
            otp_ttl: chrono::Duration::seconds(otp_secs),
            session_ttl: chrono::Duration::seconds(session_secs),
            max_answer_attempts: parse(
                var("SECURITY_ANSWER_ATTEMPTS", "3"),
                "SECURITY_ANSWER_ATTEMPTS",
            )?,
            max_otp_attempts: parse(var("OTP_ATTEMPTS", "3"), "OTP_ATTEMPTS")?,
        };

        let lock_timeout_ms: u64 = parse(var("LOCK_TIMEOUT_MS", "2000"), "LOCK_TIMEOUT_MS")?;

        let interest: InterestSchedule = var("INTEREST_TIERS", DEFAULT_INTEREST_TIERS)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("INTEREST_TIERS"))?;

        let interest_secs: u64 = parse(
            var("INTEREST_INTERVAL_SECONDS", "86400"),
            "INTEREST_INTERVAL_SECONDS",
        )?;
        if interest_secs == 0 {
            return Err(ConfigError::InvalidValue("INTEREST_INTERVAL_SECONDS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            environment,
            identifier,
            workflow,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            interest,
            jobs: JobSchedulerConfig {
                interest_interval: Duration::from_secs(interest_secs),
            },
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse<T: FromStr>(raw: String, key: &'static str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
