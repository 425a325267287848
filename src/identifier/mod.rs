//! Account number generation
//!
//! An account number is `bank code + branch code + currency code`, padded
//! with random digits and closed by a Luhn check digit. Numbers are random,
//! so callers must still check the store for collisions.

use std::collections::HashMap;

use rand::rngs::OsRng;
use rand::Rng;

use crate::domain::Currency;

/// Total length of generated account numbers
pub const DEFAULT_ACCOUNT_NUMBER_LENGTH: usize = 16;

/// Institution and currency codes used to build account numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierConfig {
    pub bank_code: String,
    pub branch_code: String,
    pub currency_codes: HashMap<Currency, String>,
    pub length: usize,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            bank_code: "289".to_string(),
            branch_code: "9374".to_string(),
            currency_codes: HashMap::from([
                (Currency::Usd, "840".to_string()),
                (Currency::Eur, "978".to_string()),
                (Currency::Xaf, "950".to_string()),
            ]),
            length: DEFAULT_ACCOUNT_NUMBER_LENGTH,
        }
    }
}

/// Setup faults of the generator. None of these are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Invalid currency: {0}")]
    UnknownCurrency(String),

    #[error("{field} must be numeric (got {value:?})")]
    NonNumericCode { field: String, value: String },

    #[error("Prefix {prefix} leaves no room for random digits in a {length}-digit number")]
    PrefixTooLong { prefix: String, length: usize },
}

/// Generator of checksum-valid account numbers
#[derive(Debug, Clone)]
pub struct AccountNumberGenerator {
    config: IdentifierConfig,
}

impl AccountNumberGenerator {
    /// Validate the configuration and build a generator
    pub fn new(config: IdentifierConfig) -> Result<Self, IdentifierError> {
        check_numeric("bank code", &config.bank_code)?;
        check_numeric("branch code", &config.branch_code)?;
        for (currency, code) in &config.currency_codes {
            check_numeric(&format!("{} currency code", currency), code)?;
        }

        let generator = Self { config };
        for currency in generator.config.currency_codes.keys() {
            generator.random_width(&generator.prefix(*currency)?)?;
        }
        Ok(generator)
    }

    /// `bank code + branch code + currency code`
    pub fn prefix(&self, currency: Currency) -> Result<String, IdentifierError> {
        let currency_code = self
            .config
            .currency_codes
            .get(&currency)
            .ok_or_else(|| IdentifierError::UnknownCurrency(currency.to_string()))?;

        Ok(format!(
            "{}{}{}",
            self.config.bank_code, self.config.branch_code, currency_code
        ))
    }

    fn random_width(&self, prefix: &str) -> Result<usize, IdentifierError> {
        match self.config.length.checked_sub(prefix.len() + 1) {
            Some(width) if width > 0 => Ok(width),
            _ => Err(IdentifierError::PrefixTooLong {
                prefix: prefix.to_string(),
                length: self.config.length,
            }),
        }
    }

    /// Generate a fresh account number for `currency`
    pub fn generate(&self, currency: Currency) -> Result<String, IdentifierError> {
        let prefix = self.prefix(currency)?;
        let width = self.random_width(&prefix)?;

        let mut number = prefix;
        number.reserve(width + 1);
        for _ in 0..width {
            let digit: u8 = OsRng.gen_range(0..10);
            number.push(char::from(b'0' + digit));
        }

        // The payload is all digits at this point
        let check = luhn_check_digit(&number).unwrap_or_default();
        number.push(char::from(b'0' + check as u8));
        Ok(number)
    }

    /// Generate from a currency name such as `"usd"`
    pub fn generate_for_code(&self, currency: &str) -> Result<String, IdentifierError> {
        let currency: Currency = currency
            .parse()
            .map_err(|_| IdentifierError::UnknownCurrency(currency.to_string()))?;
        self.generate(currency)
    }

    pub fn length(&self) -> usize {
        self.config.length
    }
}

fn check_numeric(field: &str, value: &str) -> Result<(), IdentifierError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentifierError::NonNumericCode {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Check digit for a numeric payload.
///
/// Digits are read right to left. Digits at even zero-based positions are
/// doubled and their digits summed; digits at odd positions are added as
/// they are. Returns `None` if the payload contains a non-digit.
pub fn luhn_check_digit(payload: &str) -> Option<u32> {
    let mut total = 0u32;
    for (position, ch) in payload.chars().rev().enumerate() {
        let digit = ch.to_digit(10)?;
        total += if position % 2 == 0 {
            let doubled = digit * 2;
            doubled / 10 + doubled % 10
        } else {
            digit
        };
    }
    Some((10 - total % 10) % 10)
}

/// Whether the last digit of `number` is the check digit of the rest
pub fn is_valid_account_number(number: &str) -> bool {
    let Some(last) = number.chars().last() else {
        return false;
    };
    let payload = &number[..number.len() - last.len_utf8()];
    if payload.is_empty() {
        return false;
    }
    match (luhn_check_digit(payload), last.to_digit(10)) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => false,
    }
}
