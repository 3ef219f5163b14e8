//! HTTP rate fetcher for open.er-api.com style endpoints.

use async_trait::async_trait;
use chrono::DateTime;
use convrelay_common::{constants, CurrencyCode};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, instrument};

use crate::error::FetchError;
use crate::provider::RateFetcher;
use crate::rates::RateTable;

/// Default rate endpoint; the base code is appended as the last path segment.
pub const DEFAULT_RATES_ENDPOINT: &str = "https://open.er-api.com/v6/latest";

/// Build an HTTP client with a fixed request timeout.
pub(crate) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// GET `url` and return the body of a 2xx response.
pub(crate) async fn get_body(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))
}

/// Payload of `GET <endpoint>/<BASE>`.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: Option<String>,
    rates: Option<HashMap<String, f64>>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    time_last_update_unix: Option<i64>,
}

/// Validate and convert a provider payload into a [`RateTable`].
pub fn parse_latest_rates(
    endpoint: &str,
    base: &CurrencyCode,
    body: &str,
) -> Result<RateTable, FetchError> {
    let payload: LatestRatesResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

    let rates = match (payload.result.as_deref(), payload.rates) {
        (Some("success"), Some(rates)) => rates,
        _ => {
            return Err(FetchError::Api {
                endpoint: endpoint.to_string(),
                error_type: payload
                    .error_type
                    .unwrap_or_else(|| "invalid-payload".to_string()),
            })
        }
    };

    let table = RateTable::new(base.clone(), rates);
    Ok(match payload
        .time_last_update_unix
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
    {
        Some(published_at) => table.with_published_at(published_at),
        None => table,
    })
}

/// Fetches rate tables from an exchange-rate API over HTTP.
pub struct ExchangeRateApiFetcher {
    client: Client,
    endpoint: String,
}

impl ExchangeRateApiFetcher {
    /// Create a fetcher for `endpoint` with the given request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL queried for `base`.
    pub fn url_for(&self, base: &CurrencyCode) -> String {
        format!("{}/{}", self.endpoint, base)
    }
}

impl Default for ExchangeRateApiFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_RATES_ENDPOINT, constants::fetch_timeout())
    }
}

#[async_trait]
impl RateFetcher for ExchangeRateApiFetcher {
    fn name(&self) -> &str {
        "exchange-rate-api"
    }

    #[instrument(skip(self, base), fields(base = %base))]
    async fn fetch(&self, base: &CurrencyCode) -> Result<RateTable, FetchError> {
        let url = self.url_for(base);
        debug!(url = %url, "Fetching exchange rates");

        let result = match get_body(&self.client, &url).await {
            Ok(body) => parse_latest_rates(&url, base, &body),
            Err(e) => Err(e),
        };

        match &result {
            Ok(table) => debug!(url = %url, currencies = table.len(), "Fetched exchange rates"),
            Err(e) => error!(url = %url, kind = e.kind(), error = %e, "Exchange rate fetch failed"),
        }

        result
    }
}

/// Minimal HTTP server answering canned responses, for fetcher tests.
#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// How the server answers each connection.
    #[derive(Clone)]
    pub enum Reply {
        Respond { status: &'static str, body: String },
        Hang,
    }

    /// Serve `reply` to every connection; returns the base URL.
    pub async fn spawn(reply: Reply) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let reply = reply.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }
                    match reply {
                        Reply::Respond { status, body } => {
                            let response = format!(
                                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                                body.len()
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        }
                        Reply::Hang => {
                            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                        }
                    }
                });
            }
        });

        format!("http://{addr}")
    }

    /// A URL nothing is listening on.
    pub async fn closed_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }
}
