//! Retrying HTTP client
//!
//! Thin wrapper over reqwest that adds the fixed identifying headers and
//! automatic retry with exponential backoff on transient status codes.
//! Every failure it returns is recoverable: callers log and move on.

use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Retry budget for transient status codes
const MAX_RETRIES: u32 = 5;

/// Status codes worth retrying on an idempotent GET
const RETRY_STATUS: [u16; 5] = [429, 500, 502, 503, 504];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(StatusCode),
}

pub struct HttpClient {
    http: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT_ENCODING,
            header::HeaderValue::from_static("gzip, deflate"),
        );

        let http = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { http }
    }

    fn is_retryable(status: StatusCode) -> bool {
        RETRY_STATUS.contains(&status.as_u16())
    }

    /// GET a URL and return the response body as text.
    ///
    /// Retries up to [`MAX_RETRIES`] times on {429, 500, 502, 503, 504} with
    /// exponential backoff (1s, 2s, 4s, 8s, 16s). Connection errors and
    /// timeouts are not retried; the per-request timeout already bounds them.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        for attempt in 0..=MAX_RETRIES {
            let resp = self.http.get(url).send().await?;
            let status = resp.status();

            if status.is_success() {
                return Ok(resp.text().await?);
            }

            if Self::is_retryable(status) && attempt < MAX_RETRIES {
                let backoff = Duration::from_secs(1u64 << attempt);
                warn!(
                    "fetch retry {}/{} for {} ({}), backing off {:?}",
                    attempt + 1,
                    MAX_RETRIES,
                    url,
                    status,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            return Err(FetchError::Status(status));
        }

        unreachable!("retry loop always returns")
    }
}
