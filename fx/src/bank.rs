//! Bank direct-quote overlay for the domestic currency.
//!
//! A bank publishes buy/sell quotes of foreign currencies against UAH. When
//! a request has UAH on one side and the other side is quoted, the bank
//! rate is used instead of the provider pivot:
//!
//! - UAH to X: `amount / buy(X)`
//! - X to UAH: `amount * sell(X)`
//!
//! Anything else (no UAH, unquoted currency, zero quote, bank unreachable)
//! returns `None` so the caller falls through to the pivot path.

use async_trait::async_trait;
use convrelay_common::{constants, is_fresh, CurrencyCode, SharedClock};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::http::{build_client, get_body};

/// Default bank quote endpoint.
pub const DEFAULT_BANK_ENDPOINT: &str = "https://api.monobank.ua/bank/currency";

/// ISO 4217 numeric code of UAH.
const UAH_NUMERIC: u16 = 980;

/// Map the ISO 4217 numeric codes the bank quotes to alphabetic codes.
fn alpha_code(numeric: u16) -> Option<&'static str> {
    match numeric {
        840 => Some("USD"),
        978 => Some("EUR"),
        826 => Some("GBP"),
        985 => Some("PLN"),
        756 => Some("CHF"),
        980 => Some("UAH"),
        _ => None,
    }
}

/// Buy/sell quote of one foreign currency in UAH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankQuote {
    /// UAH the bank pays for one unit of the currency.
    pub buy: f64,
    /// UAH the bank charges for one unit of the currency.
    pub sell: f64,
}

/// Quotes keyed by foreign currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BankQuotes {
    quotes: HashMap<CurrencyCode, BankQuote>,
}

impl BankQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: CurrencyCode, quote: BankQuote) {
        self.quotes.insert(code, quote);
    }

    pub fn get(&self, code: &CurrencyCode) -> Option<BankQuote> {
        self.quotes.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Source of bank quotes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &str;

    async fn quotes(&self) -> Result<BankQuotes, FetchError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BankEntry {
    currency_code_a: u16,
    currency_code_b: u16,
    rate_buy: Option<f64>,
    rate_sell: Option<f64>,
}

/// Parse a bank payload, keeping usable UAH quotes only.
pub fn parse_bank_quotes(endpoint: &str, body: &str) -> Result<BankQuotes, FetchError> {
    let entries: Vec<BankEntry> = serde_json::from_str(body).map_err(|e| FetchError::Parse {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;

    let mut quotes = BankQuotes::new();
    for entry in entries {
        if entry.currency_code_b != UAH_NUMERIC {
            continue;
        }
        let (Some(buy), Some(sell)) = (entry.rate_buy, entry.rate_sell) else {
            continue;
        };
        if buy == 0.0 || sell == 0.0 {
            continue;
        }
        if let Some(code) = alpha_code(entry.currency_code_a) {
            quotes.insert(CurrencyCode::new(code), BankQuote { buy, sell });
        }
    }
    Ok(quotes)
}

/// Monobank public currency endpoint.
pub struct MonobankQuoteSource {
    client: Client,
    endpoint: String,
}

impl MonobankQuoteSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for MonobankQuoteSource {
    fn default() -> Self {
        Self::new(DEFAULT_BANK_ENDPOINT, constants::fetch_timeout())
    }
}

#[async_trait]
impl QuoteSource for MonobankQuoteSource {
    fn name(&self) -> &str {
        "monobank"
    }

    async fn quotes(&self) -> Result<BankQuotes, FetchError> {
        let body = get_body(&self.client, &self.endpoint).await?;
        parse_bank_quotes(&self.endpoint, &body)
    }
}

/// Last successful quote table and when it was taken.
struct Snapshot {
    quotes: Arc<BankQuotes>,
    taken_at: Instant,
}

/// Guarded by the overlay's mutex.
#[derive(Default)]
struct QuoteState {
    snapshot: Option<Snapshot>,
    last_attempt_failed: bool,
}

/// Bank quotes layered in front of the pivot conversion.
pub struct BankOverlay {
    source: Arc<dyn QuoteSource>,
    clock: SharedClock,
    ttl: Duration,
    domestic: CurrencyCode,
    state: Mutex<QuoteState>,
    /// Finished quote requests, success or failure.
    completed: AtomicU64,
}

impl BankOverlay {
    /// Create an overlay reusing quotes for `ttl`.
    pub fn new(source: Arc<dyn QuoteSource>, clock: SharedClock, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            domestic: CurrencyCode::new(constants::DOMESTIC_CURRENCY),
            state: Mutex::new(QuoteState::default()),
            completed: AtomicU64::new(0),
        }
    }

    /// Check whether the overlay could apply to this pair.
    pub fn applies_to(&self, from: &CurrencyCode, to: &CurrencyCode) -> bool {
        from != to && (*from == self.domestic || *to == self.domestic)
    }

    /// Convert with bank quotes, or `None` to fall through.
    pub async fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        if !self.applies_to(from, to) {
            return None;
        }

        let quotes = self.current_quotes().await?;

        let value = if *from == self.domestic {
            let quote = quotes.get(to)?;
            (quote.buy != 0.0).then(|| amount / quote.buy)?
        } else {
            let quote = quotes.get(from)?;
            (quote.sell != 0.0).then(|| amount * quote.sell)?
        };

        value.is_finite().then_some(value)
    }

    async fn current_quotes(&self) -> Option<Arc<BankQuotes>> {
        let seen = self.completed.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if let Some(current) = state.snapshot.as_ref() {
            if is_fresh(current.taken_at, now, self.ttl) {
                return Some(current.quotes.clone());
            }
        }

        // A request finished while we waited and failed, do not queue another.
        if state.last_attempt_failed && self.completed.load(Ordering::Acquire) != seen {
            return None;
        }

        let result = self.source.quotes().await;
        state.last_attempt_failed = result.is_err();
        self.completed.fetch_add(1, Ordering::Release);

        match result {
            Ok(quotes) => {
                debug!(source = self.source.name(), quoted = quotes.len(), "Bank quotes refreshed");
                let quotes = Arc::new(quotes);
                state.snapshot = Some(Snapshot {
                    quotes: quotes.clone(),
                    taken_at: now,
                });
                Some(quotes)
            }
            Err(e) => {
                warn!(
                    source = self.source.name(),
                    endpoint = e.endpoint(),
                    error = %e,
                    "Bank quotes unavailable, using pivot rates"
                );
                None
            }
        }
    }
}

/// Mock quote source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockQuoteSource {
    response: parking_lot::Mutex<Result<BankQuotes, FetchError>>,
    calls: std::sync::atomic::AtomicUsize,
    delay: Option<Duration>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockQuoteSource {
    /// Serve the given `(code, buy, sell)` quotes.
    pub fn with_quotes(quotes: &[(&str, f64, f64)]) -> Self {
        let mut table = BankQuotes::new();
        for (code, buy, sell) in quotes {
            table.insert(CurrencyCode::new(*code), BankQuote { buy: *buy, sell: *sell });
        }
        Self {
            response: parking_lot::Mutex::new(Ok(table)),
            calls: std::sync::atomic::AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Fail every request.
    pub fn failing(error: FetchError) -> Self {
        Self {
            response: parking_lot::Mutex::new(Err(error)),
            calls: std::sync::atomic::AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep this long inside every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl QuoteSource for MockQuoteSource {
    fn name(&self) -> &str {
        "mock-bank"
    }

    async fn quotes(&self) -> Result<BankQuotes, FetchError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.lock().clone()
    }
}
