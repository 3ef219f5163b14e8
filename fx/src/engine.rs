//! Currency converter: cache lookup, fetch on miss, pivot arithmetic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use convrelay_common::{constants, system_clock, CurrencyCode, SharedClock};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::bank::BankOverlay;
use crate::cache::{CacheStats, SharedRateCache};
use crate::error::{FetchError, FxError, FxResult};
use crate::provider::SharedRateFetcher;
use crate::rates::RateTable;

/// What to do when the pivot table lacks one of the currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackStrategy {
    /// Fail the conversion.
    #[default]
    PivotOnly,
    /// Fetch the table based on the source currency and use its direct rate.
    AlternateBase,
}

/// Configuration for the currency converter.
#[derive(Debug, Clone)]
pub struct CurrencyConverterConfig {
    /// Currency every conversion is pivoted through.
    pub pivot: CurrencyCode,
    /// Behaviour when the pivot table misses a currency.
    pub fallback: FallbackStrategy,
}

impl Default for CurrencyConverterConfig {
    fn default() -> Self {
        Self {
            pivot: CurrencyCode::new(constants::PIVOT_CURRENCY),
            fallback: FallbackStrategy::PivotOnly,
        }
    }
}

/// Per-base refresh serialization.
///
/// `completed` counts finished fetch attempts. A caller that saw an older
/// count before queueing and finds a recorded failure after acquiring the
/// lock reuses that failure instead of fetching again.
#[derive(Debug, Default)]
struct RefreshSlot {
    last_failure: Mutex<Option<FetchError>>,
    completed: AtomicU64,
}

/// Counters for fetch and cache activity.
#[derive(Debug, Default)]
struct Counters {
    cache_hits: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
}

/// Converts amounts between currencies through a pivot rate table.
pub struct CurrencyConverter {
    fetcher: SharedRateFetcher,
    cache: SharedRateCache,
    clock: SharedClock,
    /// Serializes check-fetch-populate per base currency.
    refresh_slots: DashMap<CurrencyCode, Arc<RefreshSlot>>,
    overlay: Option<BankOverlay>,
    config: CurrencyConverterConfig,
    counters: Counters,
}

impl CurrencyConverter {
    /// Create a converter over the given fetcher and cache.
    pub fn new(
        fetcher: SharedRateFetcher,
        cache: SharedRateCache,
        config: CurrencyConverterConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            clock: system_clock(),
            refresh_slots: DashMap::new(),
            overlay: None,
            config,
            counters: Counters::default(),
        }
    }

    /// Use a different clock for cache expiry.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Consult bank quotes before the pivot path.
    pub fn with_bank_overlay(mut self, overlay: BankOverlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn config(&self) -> &CurrencyConverterConfig {
        &self.config
    }

    pub fn cache(&self) -> &SharedRateCache {
        &self.cache
    }

    /// Get the rate table for `base`, fetching it if missing or stale.
    ///
    /// Concurrent callers for the same base wait for a single fetch and
    /// share its outcome, including a failure.
    #[instrument(skip(self, base), fields(base = %base))]
    pub async fn rates(&self, base: &CurrencyCode) -> FxResult<Arc<RateTable>> {
        if let Some(table) = self.cache.get(base, self.clock.now()) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(table);
        }

        let slot = self.refresh_slot(base);
        let seen = slot.completed.load(Ordering::Acquire);
        let mut last_failure = slot.last_failure.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(table) = self.cache.get(base, self.clock.now()) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(table);
        }

        // An attempt finished while we waited and failed.
        if slot.completed.load(Ordering::Acquire) != seen {
            if let Some(e) = last_failure.as_ref() {
                debug!(error = %e, "Reusing failure of concurrent fetch");
                return Err(FxError::RatesUnavailable {
                    base: base.clone(),
                    source: e.clone(),
                });
            }
        }

        self.counters.fetches.fetch_add(1, Ordering::Relaxed);
        let result = self.fetcher.fetch(base).await;
        *last_failure = result.as_ref().err().cloned();
        slot.completed.fetch_add(1, Ordering::Release);

        match result {
            Ok(table) => {
                info!(
                    fetcher = self.fetcher.name(),
                    currencies = table.len(),
                    "Exchange rates updated"
                );
                Ok(self.cache.put(base, table, self.clock.now()))
            }
            Err(e) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    fetcher = self.fetcher.name(),
                    endpoint = e.endpoint(),
                    kind = e.kind(),
                    error = %e,
                    "Failed to fetch exchange rates"
                );
                Err(FxError::RatesUnavailable {
                    base: base.clone(),
                    source: e,
                })
            }
        }
    }

    /// Convert `amount`, reporting why it failed.
    pub async fn try_convert(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> FxResult<f64> {
        if from == to {
            return Ok(amount);
        }

        if let Some(overlay) = &self.overlay {
            if let Some(value) = overlay.convert(amount, from, to).await {
                debug!(from = %from, to = %to, "Converted with bank quotes");
                return Ok(value);
            }
        }

        let pivot = &self.config.pivot;
        let rates = self.rates(pivot).await?;

        let (rate_from, rate_to) = match (rates.get(from), rates.get(to)) {
            (Some(rate_from), Some(rate_to)) => (rate_from, rate_to),
            _ => {
                let missing = if rates.contains(from) { to } else { from };
                warn!(currency = %missing, base = %pivot, "Currency not found in pivot rates");

                if self.config.fallback == FallbackStrategy::AlternateBase && from != pivot {
                    return self.convert_via_source_base(amount, from, to).await;
                }
                return Err(FxError::UnknownCurrency {
                    code: missing.clone(),
                    base: pivot.clone(),
                });
            }
        };

        if rate_from == 0.0 {
            error!(currency = %from, base = %pivot, "Zero exchange rate from provider");
            return Err(FxError::ZeroRate {
                code: from.clone(),
                base: pivot.clone(),
            });
        }

        let value = (amount / rate_from) * rate_to;
        if !value.is_finite() {
            error!(from = %from, to = %to, rate_from, rate_to, "Degenerate exchange rates");
            return Err(FxError::NonFiniteResult {
                from: from.clone(),
                to: to.clone(),
            });
        }

        Ok(value)
    }

    /// Convert `amount` between two currency tokens.
    ///
    /// Tokens are uppercased. Every failure is logged and returned as `None`.
    pub async fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        let from = CurrencyCode::new(from);
        let to = CurrencyCode::new(to);

        match self.try_convert(amount, &from, &to).await {
            Ok(value) => {
                debug!(amount, from = %from, to = %to, value, "Currency converted");
                Some(value)
            }
            Err(e) => {
                warn!(amount, from = %from, to = %to, error = %e, "Currency conversion failed");
                None
            }
        }
    }

    /// Get converter statistics.
    pub fn stats(&self) -> FxStats {
        FxStats {
            cache: self.cache.stats(self.clock.now()),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            fetch_failures: self.counters.fetch_failures.load(Ordering::Relaxed),
        }
    }

    async fn convert_via_source_base(
        &self,
        amount: f64,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> FxResult<f64> {
        info!(base = %from, to = %to, "Trying rates based on source currency");
        let rates = self.rates(from).await?;

        let rate = rates.get(to).ok_or_else(|| FxError::UnknownCurrency {
            code: to.clone(),
            base: from.clone(),
        })?;

        let value = amount * rate;
        if !value.is_finite() {
            return Err(FxError::NonFiniteResult {
                from: from.clone(),
                to: to.clone(),
            });
        }
        Ok(value)
    }

    fn refresh_slot(&self, base: &CurrencyCode) -> Arc<RefreshSlot> {
        self.refresh_slots.entry(base.clone()).or_default().clone()
    }
}

/// Converter statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FxStats {
    pub cache: CacheStats,
    pub cache_hits: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
}

/// Shared converter.
pub type SharedCurrencyConverter = Arc<CurrencyConverter>;
