//! FX error types.

use convrelay_common::CurrencyCode;
use thiserror::Error;

/// Failure to obtain a rate table from a remote source.
///
/// Fetchers return this as a value; it never escapes as a panic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The request exceeded the client timeout.
    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// Connection or transport failure.
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// Non-2xx HTTP status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// Body was not the expected JSON.
    #[error("Malformed response from {endpoint}: {message}")]
    Parse { endpoint: String, message: String },

    /// Provider answered but reported an error or omitted the rates.
    #[error("Rate provider error from {endpoint}: {error_type}")]
    Api { endpoint: String, error_type: String },
}

impl FetchError {
    /// Map a transport error from the HTTP client.
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        let endpoint = endpoint.to_string();
        if err.is_timeout() {
            FetchError::Timeout { endpoint }
        } else if let Some(status) = err.status() {
            FetchError::Status {
                endpoint,
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            FetchError::Parse {
                endpoint,
                message: err.to_string(),
            }
        } else {
            FetchError::Network {
                endpoint,
                message: err.to_string(),
            }
        }
    }

    /// Short failure class for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Timeout { .. } => "timeout",
            FetchError::Network { .. } => "network",
            FetchError::Status { .. } => "status",
            FetchError::Parse { .. } => "parse",
            FetchError::Api { .. } => "api",
        }
    }

    /// Endpoint the failed request targeted.
    pub fn endpoint(&self) -> &str {
        match self {
            FetchError::Timeout { endpoint }
            | FetchError::Network { endpoint, .. }
            | FetchError::Status { endpoint, .. }
            | FetchError::Parse { endpoint, .. }
            | FetchError::Api { endpoint, .. } => endpoint,
        }
    }

    /// Check if a later attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Network { .. } => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Parse { .. } | FetchError::Api { .. } => false,
        }
    }
}

/// Reasons a currency conversion could not be computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FxError {
    /// No fresh table for the base and the fetch failed.
    #[error("Rates for base {base} unavailable: {source}")]
    RatesUnavailable {
        base: CurrencyCode,
        #[source]
        source: FetchError,
    },

    /// The provider does not quote this currency against the base.
    #[error("Currency {code} not found in rates for base {base}")]
    UnknownCurrency { code: CurrencyCode, base: CurrencyCode },

    /// The provider quoted a zero rate, which cannot be divided by.
    #[error("Rate for {code} against {base} is zero")]
    ZeroRate { code: CurrencyCode, base: CurrencyCode },

    /// The rates produced an infinite or NaN amount.
    #[error("Converting {from} to {to} produced a non-finite amount")]
    NonFiniteResult { from: CurrencyCode, to: CurrencyCode },
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kind_and_endpoint() {
        let err = FetchError::Status {
            endpoint: "https://rates.test/USD".into(),
            status: 503,
        };

        assert_eq!(err.kind(), "status");
        assert_eq!(err.endpoint(), "https://rates.test/USD");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_retryable_classes() {
        let timeout = FetchError::Timeout {
            endpoint: "x".into(),
        };
        let api = FetchError::Api {
            endpoint: "x".into(),
            error_type: "unsupported-code".into(),
        };
        let not_found = FetchError::Status {
            endpoint: "x".into(),
            status: 404,
        };

        assert!(timeout.is_retryable());
        assert!(!api.is_retryable());
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_fx_error_display() {
        let err = FxError::UnknownCurrency {
            code: CurrencyCode::new("XYZ"),
            base: CurrencyCode::usd(),
        };
        assert_eq!(err.to_string(), "Currency XYZ not found in rates for base USD");
    }
}
