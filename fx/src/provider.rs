//! Rate fetcher trait and test double.

use async_trait::async_trait;
use convrelay_common::CurrencyCode;
use std::sync::Arc;

use crate::error::FetchError;
use crate::rates::RateTable;

/// Source of fresh rate tables.
///
/// This is the only I/O boundary of the currency path; implementations
/// must not block the executor and must report every failure as a
/// [`FetchError`] value.
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Get the fetcher name.
    fn name(&self) -> &str;

    /// Fetch the table of rates quoted against `base`.
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateTable, FetchError>;
}

/// Shared fetcher handle.
pub type SharedRateFetcher = Arc<dyn RateFetcher>;

/// Mock rate fetcher for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateFetcher {
    name: String,
    tables: dashmap::DashMap<CurrencyCode, RateTable>,
    failure: parking_lot::Mutex<Option<FetchError>>,
    delay: Option<std::time::Duration>,
    calls: dashmap::DashMap<CurrencyCode, usize>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateFetcher {
    /// Create a new mock fetcher with no tables.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: dashmap::DashMap::new(),
            failure: parking_lot::Mutex::new(None),
            delay: None,
            calls: dashmap::DashMap::new(),
        }
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve `table` for its base currency.
    pub fn set_table(&self, table: RateTable) {
        self.tables.insert(table.base().clone(), table);
    }

    /// Serve `(code, rate)` pairs for `base`.
    pub fn set_rates(&self, base: &str, rates: &[(&str, f64)]) {
        self.set_table(RateTable::new(CurrencyCode::new(base), rates.iter().copied()));
    }

    /// Make every fetch fail with `error` until cleared.
    pub fn fail_with(&self, error: FetchError) {
        *self.failure.lock() = Some(error);
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Total number of fetch calls.
    pub fn calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Number of fetch calls for one base.
    pub fn calls_for(&self, base: &str) -> usize {
        self.calls
            .get(&CurrencyCode::new(base))
            .map(|count| *count)
            .unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateFetcher for MockRateFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, base: &CurrencyCode) -> Result<RateTable, FetchError> {
        *self.calls.entry(base.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.lock().clone();
        if let Some(error) = failure {
            return Err(error);
        }

        self.tables
            .get(base)
            .map(|table| table.clone())
            .ok_or_else(|| FetchError::Api {
                endpoint: format!("mock://{}/{}", self.name, base),
                error_type: "unsupported-code".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_serves_tables() {
        let fetcher = MockRateFetcher::new("test");
        fetcher.set_rates("USD", &[("USD", 1.0), ("EUR", 0.92)]);

        let table = fetcher.fetch(&CurrencyCode::usd()).await.unwrap();

        assert_eq!(table.get(&CurrencyCode::eur()), Some(0.92));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(fetcher.calls_for("usd"), 1);
    }

    #[tokio::test]
    async fn test_mock_fetcher_unknown_base() {
        let fetcher = MockRateFetcher::new("test");

        let result = fetcher.fetch(&CurrencyCode::new("XYZ")).await;

        assert!(matches!(result, Err(FetchError::Api { .. })));
    }

    #[tokio::test]
    async fn test_mock_fetcher_failure() {
        let fetcher = MockRateFetcher::new("test");
        fetcher.set_rates("USD", &[("USD", 1.0)]);
        fetcher.fail_with(FetchError::Timeout {
            endpoint: "mock".into(),
        });

        let err = fetcher.fetch(&CurrencyCode::usd()).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");

        fetcher.clear_failure();
        tokio_test::assert_ok!(fetcher.fetch(&CurrencyCode::usd()).await);
    }
}
