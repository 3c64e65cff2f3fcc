//! Ledger identifiers

use crate::crypto::Digest256;
use crate::errors::{Result, SortesError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of an account name
pub const MAX_ACCOUNT_NAME_LEN: usize = 32;

/// Ledger account name
///
/// Account names are lowercase ASCII letters, digits, `-` and `.`, must start
/// with a letter and are at most [`MAX_ACCOUNT_NAME_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Validate and wrap an account name
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_ACCOUNT_NAME_LEN {
            return Err(SortesError::invalid(format!(
                "account name must be 1..={MAX_ACCOUNT_NAME_LEN} characters, got {}",
                name.len()
            )));
        }
        if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(SortesError::invalid(format!(
                "account name must start with a lowercase letter: {name:?}"
            )));
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '.'))
        {
            return Err(SortesError::invalid(format!(
                "account name {name:?} contains invalid character {bad:?}"
            )));
        }
        Ok(Self(name))
    }

    /// Borrow the name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = SortesError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl FromStr for AccountId {
    type Err = SortesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction identifier: SHA-256 of the signed transaction body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub Digest256);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", &self.0.to_hex()[..16])
    }
}
