//! Conversion request and result types exchanged with the host.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RequestId;

/// A parsed conversion request: `amount from to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Correlation id.
    pub id: RequestId,
    /// Amount to convert.
    pub amount: f64,
    /// Source token, as typed.
    pub from: String,
    /// Target token, as typed.
    pub to: String,
}

impl ConversionRequest {
    /// Create a new request with a fresh id.
    pub fn new(amount: f64, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            amount,
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Why a currency conversion could not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Rates were unavailable, a code was unknown to the provider, or the
    /// provider data was degenerate.
    CurrencyNotResolved,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::CurrencyNotResolved => f.write_str("currency not resolved"),
        }
    }
}

/// Outcome of classifying and converting a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConversionResult {
    /// Physical unit conversion succeeded.
    Unit(f64),
    /// Currency conversion succeeded.
    Currency(f64),
    /// Tokens are neither known units nor plausible currency codes.
    Unrecognized,
    /// Tokens looked like currencies but conversion failed.
    Failed(FailureReason),
}

impl ConversionResult {
    /// Converted value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            ConversionResult::Unit(v) | ConversionResult::Currency(v) => Some(*v),
            _ => None,
        }
    }

    /// Check if a value was produced.
    pub fn is_success(&self) -> bool {
        self.value().is_some()
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ConversionResult::Unit(_) => "unit",
            ConversionResult::Currency(_) => "currency",
            ConversionResult::Unrecognized => "unrecognized",
            ConversionResult::Failed(_) => "failed",
        }
    }
}
