//! convrelay FX
//!
//! Exchange rates and currency conversion for the conversion relay.
//!
//! # Features
//!
//! - Pivot-currency conversion over a cached rate table
//! - Rate caching with configurable TTL and per-base refresh locking
//! - HTTP rate fetcher with a fixed timeout
//! - Optional direct bank quotes for the domestic currency
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use convrelay_fx::{CurrencyConverter, CurrencyConverterConfig, ExchangeRateApiFetcher, RateCache};
//!
//! let converter = CurrencyConverter::new(
//!     Arc::new(ExchangeRateApiFetcher::default()),
//!     Arc::new(RateCache::new()),
//!     CurrencyConverterConfig::default(),
//! );
//!
//! let uah = converter.convert(100.0, "USD", "UAH").await;
//! ```

pub mod bank;
pub mod cache;
pub mod engine;
pub mod error;
pub mod http;
pub mod provider;
pub mod rates;

pub use bank::{
    BankOverlay, BankQuote, BankQuotes, MonobankQuoteSource, QuoteSource, DEFAULT_BANK_ENDPOINT,
};
pub use cache::{CacheStats, RateCache, RateCacheConfig, SharedRateCache};
pub use engine::{
    CurrencyConverter, CurrencyConverterConfig, FallbackStrategy, FxStats,
    SharedCurrencyConverter,
};
pub use error::{FetchError, FxError, FxResult};
pub use http::{ExchangeRateApiFetcher, DEFAULT_RATES_ENDPOINT};
pub use provider::{RateFetcher, SharedRateFetcher};
pub use rates::RateTable;

#[cfg(any(test, feature = "test-utils"))]
pub use bank::MockQuoteSource;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateFetcher;
