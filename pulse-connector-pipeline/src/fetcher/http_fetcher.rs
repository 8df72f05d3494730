//! HTTP fetcher implementation for the pulse connector.
//!
//! Issues paginated GET requests against the source API and handles the
//! retry/backoff policy for transient failures.

use std::time::Duration;

use reqwest::{header, StatusCode};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::PipelineError;
use crate::fetcher::pages::PageCursor;

/// The endpoint for subscribed pulses.
pub const SUBSCRIBED_PULSES_ENDPOINT: &str = "pulses/subscribed";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "X-OTX-API-KEY";

/// Configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Number of records requested per page.
    pub page_size: usize,
    /// Safety ceiling on the number of pages fetched in one run.
    pub max_pages: u32,
    /// Maximum number of attempts per page request.
    pub max_retries: u32,
    /// Initial backoff delay; doubles after every retried attempt.
    pub initial_backoff: Duration,
    /// Per-request socket timeout.
    pub request_timeout: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 100,
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Fetcher that pulls records from the source REST API.
///
/// Owns its HTTP client: the API key header and socket timeout are set once
/// at construction, and the underlying connections are released when the
/// fetcher is dropped at the end of the run.
pub struct PulseFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    config: FetcherConfig,
}

impl PulseFetcher {
    /// Create a new fetcher for the given API.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the source API
    /// * `api_key` - API key, sent in the `X-OTX-API-KEY` header
    /// * `connector_name` - Included in the User-Agent for operator traceability
    /// * `config` - Pagination and retry configuration
    pub fn new(
        base_url: &str,
        api_key: &str,
        connector_name: &str,
        config: FetcherConfig,
    ) -> Result<Self, PipelineError> {
        let mut headers = header::HeaderMap::new();
        let key_value = header::HeaderValue::from_str(api_key).map_err(|_| {
            PipelineError::fetcher("API key contains characters that are not valid in a header")
        })?;
        headers.insert(API_KEY_HEADER, key_value);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!("pulse-connector/1.0 ({})", connector_name))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PipelineError::fetcher(e.to_string()))?;

        info!(base_url = %base_url, "Created HTTP fetcher");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            config,
        })
    }

    /// Base URL the fetcher was constructed with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Start paginating the given endpoint.
    ///
    /// The returned cursor is lazy: each `next_page` call issues one request.
    /// Pagination state lives only in the cursor, so a new run always starts
    /// from the first page.
    pub fn pages(&self, endpoint: &str) -> PageCursor<'_> {
        PageCursor::new(self, endpoint)
    }

    /// Fetch a single observation record for the given city.
    ///
    /// Goes through the same retry path as page requests; the API key is
    /// passed as the `appid` query parameter, which is how the weather API
    /// expects it.
    pub async fn fetch_observation(&self, city: &str) -> Result<Value, PipelineError> {
        let query = [
            ("q".to_string(), city.to_string()),
            ("appid".to_string(), self.api_key.clone()),
        ];
        self.get_with_retry(&self.base_url, &query).await
    }

    /// GET with retries and backoff.
    ///
    /// Retryable: transport failures, HTTP 429 (honoring a numeric
    /// `Retry-After` header when present) and 5xx, all sharing one attempt
    /// ceiling. Any other non-success status fails immediately. The backoff
    /// delay doubles after every retried attempt, including those where a
    /// `Retry-After` value was slept instead.
    pub(crate) async fn get_with_retry(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<Value, PipelineError> {
        let mut backoff = self.config.initial_backoff;

        for attempt in 1..=self.config.max_retries {
            let response = match self.client.get(url).query(query).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "Request failed, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    continue;
                }
            };

            let status = response.status();

            if status.is_success() {
                return response.json::<Value>().await.map_err(|e| {
                    PipelineError::parse(format!("invalid JSON body from {}: {}", url, e))
                });
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let sleep_for = retry_after(&response).unwrap_or(backoff);
                warn!(
                    attempt = attempt,
                    sleep_secs = sleep_for.as_secs_f64(),
                    "Rate limited (429), sleeping before retry"
                );
                tokio::time::sleep(sleep_for).await;
                backoff *= 2;
                continue;
            }

            if status.is_server_error() {
                warn!(
                    attempt = attempt,
                    status = status.as_u16(),
                    sleep_secs = backoff.as_secs_f64(),
                    "Server error, backing off"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            // Remaining client errors (401, 403, 404, ...) are not retryable.
            return Err(PipelineError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Err(PipelineError::RetryExhausted {
            url: url.to_string(),
            attempts: self.config.max_retries,
        })
    }
}

/// Parse a numeric `Retry-After` header into a delay.
///
/// Date-formatted values are ignored; the caller falls back to its current
/// backoff in that case.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
