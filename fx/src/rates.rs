//! Rate tables.

use chrono::{DateTime, Utc};
use convrelay_common::CurrencyCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rates quoted against one base currency.
///
/// `get(X)` is how many units of X one unit of the base buys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, f64>,
    /// When the provider last updated the quotes, if it said so.
    published_at: Option<DateTime<Utc>>,
}

impl RateTable {
    /// Create a table from `(code, rate)` pairs.
    pub fn new<K, I>(base: CurrencyCode, rates: I) -> Self
    where
        K: Into<CurrencyCode>,
        I: IntoIterator<Item = (K, f64)>,
    {
        Self {
            base,
            rates: rates.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            published_at: None,
        }
    }

    /// Attach the provider's publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Rate of `code` per one unit of the base.
    pub fn get(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.rates.contains_key(code)
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    /// Quoted codes, sorted.
    pub fn codes(&self) -> Vec<&CurrencyCode> {
        let mut codes: Vec<_> = self.rates.keys().collect();
        codes.sort();
        codes
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_uppercased() {
        let table = RateTable::new(CurrencyCode::usd(), [("uah", 39.5), ("EUR", 0.92)]);

        assert_eq!(table.get(&CurrencyCode::uah()), Some(39.5));
        assert_eq!(table.get(&CurrencyCode::new("gbp")), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_codes_sorted() {
        let table = RateTable::new(CurrencyCode::usd(), [("UAH", 39.5), ("EUR", 0.92), ("USD", 1.0)]);
        let codes: Vec<_> = table.codes().into_iter().map(|c| c.code().to_string()).collect();

        assert_eq!(codes, vec!["EUR", "UAH", "USD"]);
    }
}
