//! Currency codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Check whether a token could plausibly be a currency code.
///
/// Exactly three alphabetic characters. This is the only syntactic test the
/// relay applies; real validity is decided by the rate provider.
pub fn looks_like_currency(token: &str) -> bool {
    token.chars().count() == 3 && token.chars().all(char::is_alphabetic)
}

/// Check whether both tokens could be currency codes.
pub fn is_currency_pair(from: &str, to: &str) -> bool {
    looks_like_currency(from) && looks_like_currency(to)
}

/// Three-letter currency code, stored uppercase.
///
/// Any alphabetic three-letter token is accepted; there is no registry
/// check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a currency code, uppercasing the input.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Parse a user token, returning `None` unless it looks like a currency.
    pub fn parse(token: &str) -> Option<Self> {
        looks_like_currency(token).then(|| Self::new(token))
    }

    /// Get the code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw token.
    pub fn matches(&self, token: &str) -> bool {
        self.0 == token.to_uppercase()
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn uah() -> Self {
        Self::new("UAH")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
