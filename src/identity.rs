use std::{borrow::Borrow, fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const CNIC_LEN: usize = 13;
const PIN_LEN: usize = 4;
const ACCOUNT_NUMBER_PREFIX: &str = "ACC";
const ACCOUNT_NUMBER_DIGITS: usize = 6;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("CNIC must be exactly 13 digits and numeric")]
    Cnic,
    #[error("Password must be exactly 4 digits and numeric")]
    PinFormat,
    #[error("Passwords do not match")]
    PinMismatch,
    #[error("Account number must be `ACC` followed by 6 digits, got `{0}`")]
    AccountNumber(String),
}

fn is_digits(input: &str, len: usize) -> bool {
    input.len() == len && input.bytes().all(|b| b.is_ascii_digit())
}

/// Unique account key, `ACC` followed by 6 digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Draws a random number. Uniqueness is the caller's concern.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!(
            "{ACCOUNT_NUMBER_PREFIX}{}",
            rng.gen_range(100_000..=999_999)
        ))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.strip_prefix(ACCOUNT_NUMBER_PREFIX) {
            Some(digits) if is_digits(digits, ACCOUNT_NUMBER_DIGITS) => Ok(Self(input.to_owned())),
            _ => Err(ValidationError::AccountNumber(input.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for AccountNumber {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountNumber {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountNumber> for String {
    fn from(number: AccountNumber) -> Self {
        number.0
    }
}

/// National identity number, kept as a fixed width digit string so leading
/// zeros survive persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "String")]
pub struct Cnic(String);

impl Cnic {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if is_digits(input, CNIC_LEN) {
            Ok(Self(input.to_owned()))
        } else {
            Err(ValidationError::Cnic)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Older snapshots store the CNIC as a JSON integer.
impl TryFrom<serde_json::Value> for Cnic {
    type Error = ValidationError;

    fn try_from(raw: serde_json::Value) -> Result<Self, Self::Error> {
        match raw {
            serde_json::Value::String(text) => Self::parse(&text),
            serde_json::Value::Number(number) => match number.as_u64() {
                Some(number) => Self::parse(&format!("{number:0width$}", width = CNIC_LEN)),
                None => Err(ValidationError::Cnic),
            },
            _ => Err(ValidationError::Cnic),
        }
    }
}

impl From<Cnic> for String {
    fn from(cnic: Cnic) -> Self {
        cnic.0
    }
}

impl fmt::Display for Cnic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated 4 digit PIN. Only ever leaves this type as a [`PasswordHash`].
#[derive(Clone)]
pub struct Pin(String);

impl Pin {
    /// Checks the format of `pin` first, then that `confirmation` matches it.
    pub fn parse(pin: &str, confirmation: &str) -> Result<Self, ValidationError> {
        if !is_digits(pin, PIN_LEN) {
            return Err(ValidationError::PinFormat);
        }
        if pin != confirmation {
            return Err(ValidationError::PinMismatch);
        }
        Ok(Self(pin.to_owned()))
    }

    pub fn hash(&self) -> PasswordHash {
        PasswordHash::of(&self.0)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

/// Lowercase hex SHA-256 digest of a PIN.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn of(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn matches(&self, secret: &str) -> bool {
        *self == Self::of(secret)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}
