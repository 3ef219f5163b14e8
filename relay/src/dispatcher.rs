//! Routes conversion requests to the unit or currency converter.

use std::sync::Arc;

use convrelay_common::{
    is_currency_pair, system_clock, ConversionRequest, ConversionResult, CurrencyCode,
    FailureReason,
};
use convrelay_fx::{
    BankOverlay, CurrencyConverter, CurrencyConverterConfig, ExchangeRateApiFetcher,
    FallbackStrategy, FxStats, MonobankQuoteSource, RateCache, RateCacheConfig,
    SharedCurrencyConverter,
};
use convrelay_units::UnitConverter;
use tracing::{debug, info, instrument};

use crate::command::{self, Command};
use crate::config::RelayConfig;
use crate::metrics::{Metrics, SharedMetrics};
use crate::reply;

/// Classifies requests and produces replies.
pub struct ConversionDispatcher {
    units: UnitConverter,
    currencies: SharedCurrencyConverter,
    metrics: SharedMetrics,
}

impl ConversionDispatcher {
    /// Create a dispatcher over the given converters.
    pub fn new(units: UnitConverter, currencies: SharedCurrencyConverter) -> Self {
        Self {
            units,
            currencies,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Build the HTTP-backed converter stack described by `config`.
    pub fn from_config(config: &RelayConfig) -> Self {
        let rates = &config.rates;
        let fetcher = Arc::new(ExchangeRateApiFetcher::new(
            rates.endpoint.as_str(),
            rates.fetch_timeout,
        ));
        let cache = Arc::new(RateCache::with_config(RateCacheConfig {
            ttl: rates.cache_ttl,
        }));
        let fallback = if rates.alternate_base {
            FallbackStrategy::AlternateBase
        } else {
            FallbackStrategy::PivotOnly
        };

        let mut currencies = CurrencyConverter::new(
            fetcher,
            cache,
            CurrencyConverterConfig {
                pivot: CurrencyCode::new(rates.pivot.as_str()),
                fallback,
            },
        );

        if config.bank.enabled {
            let source = Arc::new(MonobankQuoteSource::new(
                config.bank.endpoint.as_str(),
                rates.fetch_timeout,
            ));
            currencies = currencies.with_bank_overlay(BankOverlay::new(
                source,
                system_clock(),
                config.bank.quote_ttl,
            ));
        }

        info!(
            rates_endpoint = %rates.endpoint,
            pivot = %rates.pivot,
            alternate_base = rates.alternate_base,
            bank_overlay = config.bank.enabled,
            "Conversion dispatcher configured"
        );

        Self::new(UnitConverter::default(), Arc::new(currencies))
    }

    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Currency converter statistics.
    pub fn fx_stats(&self) -> FxStats {
        self.currencies.stats()
    }

    /// Classify and convert one `(amount, from, to)` triple.
    ///
    /// Unit conversion wins; tokens that both look like currency codes go to
    /// the currency converter; anything else is unrecognized.
    pub async fn classify(&self, amount: f64, from: &str, to: &str) -> ConversionResult {
        if let Some(value) = self.units.convert(amount, from, to) {
            return ConversionResult::Unit(value);
        }

        if !is_currency_pair(from, to) {
            return ConversionResult::Unrecognized;
        }

        match self.currencies.convert(amount, from, to).await {
            Some(value) => ConversionResult::Currency(value),
            None => ConversionResult::Failed(FailureReason::CurrencyNotResolved),
        }
    }

    /// Classify a parsed request and record its outcome.
    #[instrument(skip(self, request), fields(request_id = %request.id))]
    pub async fn handle(&self, request: &ConversionRequest) -> ConversionResult {
        let result = self
            .classify(request.amount, &request.from, &request.to)
            .await;
        self.metrics.record(&result);

        info!(
            amount = request.amount,
            from = %request.from,
            to = %request.to,
            outcome = result.outcome(),
            "Conversion handled"
        );
        result
    }

    /// Turn one line of user input into reply text.
    pub async fn respond(&self, text: &str) -> String {
        match command::parse(text) {
            Ok(Command::Start) => reply::start_text(),
            Ok(Command::Help) => reply::help_text(self.units.catalog()),
            Ok(Command::Convert(request)) => {
                let result = self.handle(&request).await;
                reply::format_reply(&request, &result)
            }
            Err(e) => {
                debug!(error = %e, "Input rejected");
                self.metrics.command_rejected();
                reply::error_reply(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convrelay_fx::{FetchError, MockRateFetcher};

    fn dispatcher() -> (ConversionDispatcher, Arc<MockRateFetcher>) {
        let fetcher = Arc::new(MockRateFetcher::new("test"));
        fetcher.set_rates("USD", &[("USD", 1.0), ("UAH", 39.5), ("EUR", 0.92)]);

        let currencies = CurrencyConverter::new(
            fetcher.clone(),
            Arc::new(RateCache::new()),
            CurrencyConverterConfig::default(),
        );
        let dispatcher = ConversionDispatcher::new(UnitConverter::default(), Arc::new(currencies));
        (dispatcher, fetcher)
    }

    #[tokio::test]
    async fn test_unit_conversion() {
        let (dispatcher, fetcher) = dispatcher();

        let result = dispatcher.classify(7.32, "m", "yd").await;
        let value = result.value().unwrap();
        assert!((value - 7.32 / 0.9144).abs() < 1e-12);
        assert!(matches!(result, ConversionResult::Unit(_)));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_currency_conversion() {
        let (dispatcher, _) = dispatcher();

        assert_eq!(
            dispatcher.classify(100.0, "USD", "uah").await,
            ConversionResult::Currency(3950.0)
        );
        assert_eq!(
            dispatcher.classify(100.0, "EUR", "GBP").await,
            ConversionResult::Failed(FailureReason::CurrencyNotResolved)
        );
    }

    #[tokio::test]
    async fn test_unit_wins_over_currency() {
        let (dispatcher, fetcher) = dispatcher();

        // "gal" is both a unit and a plausible currency code
        let result = dispatcher.classify(2.0, "gal", "GAL").await;
        assert!(matches!(result, ConversionResult::Unit(v) if (v - 2.0).abs() < 1e-12));
        assert_eq!(fetcher.calls(), 0);

        // Unit lookup fails, so the pair is tried as currencies
        assert_eq!(
            dispatcher.classify(2.0, "gal", "usd").await,
            ConversionResult::Failed(FailureReason::CurrencyNotResolved)
        );
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized() {
        let (dispatcher, fetcher) = dispatcher();

        assert_eq!(
            dispatcher.classify(5.0, "kg", "m").await,
            ConversionResult::Unrecognized
        );
        assert_eq!(
            dispatcher.classify(5.0, "km", "xyzw").await,
            ConversionResult::Unrecognized
        );
        assert_eq!(
            dispatcher.classify(5.0, "US1", "UAH").await,
            ConversionResult::Unrecognized
        );
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_failed_result() {
        let (dispatcher, fetcher) = dispatcher();
        fetcher.fail_with(FetchError::Timeout {
            endpoint: "mock".into(),
        });

        let reply = dispatcher.respond("/convert 100 USD to UAH").await;
        assert!(reply.starts_with("Could not convert USD to UAH."));
        assert_eq!(dispatcher.fx_stats().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_respond() {
        let (dispatcher, _) = dispatcher();

        assert_eq!(
            dispatcher.respond("/convert 100 usd to uah").await,
            "100 USD = 3950.00 UAH"
        );
        assert_eq!(dispatcher.respond("5 km to m").await, "5 KM = 5000.0000 M");
        assert!(dispatcher.respond("/help").await.contains("Mass: mg, g, kg, t, oz, lb"));
        assert_eq!(dispatcher.respond("/convert 100 USD").await, reply::usage_text());

        let snapshot = dispatcher.metrics().snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.currency_results, 1);
        assert_eq!(snapshot.unit_results, 1);
        assert_eq!(snapshot.rejected_commands, 1);
    }
}
