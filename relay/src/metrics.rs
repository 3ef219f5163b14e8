//! Metrics collection for relay monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use convrelay_common::ConversionResult;

/// Relay metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total conversion requests classified.
    pub requests_total: AtomicU64,
    /// Requests answered by the unit converter.
    pub unit_results: AtomicU64,
    /// Requests answered by the currency converter.
    pub currency_results: AtomicU64,
    /// Requests whose tokens were neither units nor currencies.
    pub unrecognized: AtomicU64,
    /// Currency requests that could not be resolved.
    pub failed: AtomicU64,
    /// Input lines rejected before classification.
    pub rejected_commands: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one request.
    pub fn record(&self, result: &ConversionResult) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            ConversionResult::Unit(_) => &self.unit_results,
            ConversionResult::Currency(_) => &self.currency_results,
            ConversionResult::Unrecognized => &self.unrecognized,
            ConversionResult::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record input that did not parse.
    pub fn command_rejected(&self) {
        self.rejected_commands.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            unit_results: self.unit_results.load(Ordering::Relaxed),
            currency_results: self.currency_results.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected_commands: self.rejected_commands.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP convrelay_requests_total Total conversion requests
# TYPE convrelay_requests_total counter
convrelay_requests_total {}

# HELP convrelay_results_total Conversion requests by outcome
# TYPE convrelay_results_total counter
convrelay_results_total{{outcome="unit"}} {}
convrelay_results_total{{outcome="currency"}} {}
convrelay_results_total{{outcome="unrecognized"}} {}
convrelay_results_total{{outcome="failed"}} {}

# HELP convrelay_rejected_commands_total Input lines that did not parse
# TYPE convrelay_rejected_commands_total counter
convrelay_rejected_commands_total {}
"#,
            snapshot.requests_total,
            snapshot.unit_results,
            snapshot.currency_results,
            snapshot.unrecognized,
            snapshot.failed,
            snapshot.rejected_commands,
        )
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub unit_results: u64,
    pub currency_results: u64,
    pub unrecognized: u64,
    pub failed: u64,
    pub rejected_commands: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<Metrics>;

#[cfg(test)]
mod tests {
    use super::*;
    use convrelay_common::FailureReason;

    #[test]
    fn test_metrics_record() {
        let metrics = Metrics::new();

        metrics.record(&ConversionResult::Unit(1.0));
        metrics.record(&ConversionResult::Currency(2.0));
        metrics.record(&ConversionResult::Failed(FailureReason::CurrencyNotResolved));
        metrics.command_rejected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 3);
        assert_eq!(snapshot.unit_results, 1);
        assert_eq!(snapshot.currency_results, 1);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.unrecognized, 0);
        assert_eq!(snapshot.rejected_commands, 1);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = Metrics::new();
        metrics.record(&ConversionResult::Unrecognized);

        let output = metrics.to_prometheus();
        assert!(output.contains("convrelay_requests_total 1"));
        assert!(output.contains(r#"convrelay_results_total{outcome="unrecognized"} 1"#));
    }
}
