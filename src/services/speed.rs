//! Channel throughput measurement
//!
//! Issues a streaming GET against a candidate channel URL and derives an
//! effective download rate from the declared content length and the wall
//! clock. A stream that keeps sending past the read budget is cut off early.

use futures::StreamExt;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;

/// Assumed content length when the header is absent or invalid (100 KB)
const DEFAULT_CONTENT_LENGTH: u64 = 102_400;

/// Stop draining the body once this much wall-clock time has passed
const READ_BUDGET: Duration = Duration::from_secs(8);

/// Floor on elapsed time, so near-instant responses do not blow up the ratio
const MIN_ELAPSED_SECS: f64 = 0.1;

pub struct SpeedTester {
    http: Client,
}

impl SpeedTester {
    pub fn new(user_agent: &str, timeout_secs: u64) -> Self {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { http }
    }

    /// Measure the effective download rate of `url` in KB/s.
    ///
    /// Never fails: any error during the request or the streamed read yields
    /// 0.0, which rejects the channel at the acceptance threshold.
    pub async fn measure(&self, url: &str) -> f64 {
        match self.try_measure(url).await {
            Ok(kbps) => kbps,
            Err(e) => {
                debug!("speed test failed [{}]: {}", url, e);
                0.0
            }
        }
    }

    async fn try_measure(&self, url: &str) -> Result<f64, reqwest::Error> {
        let start = Instant::now();
        let resp = self.http.get(url).send().await?.error_for_status()?;
        let content_length = resp.content_length().unwrap_or(DEFAULT_CONTENT_LENGTH);

        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            chunk?;
            if start.elapsed() > READ_BUDGET {
                break;
            }
        }

        let elapsed = start.elapsed().as_secs_f64().max(MIN_ELAPSED_SECS);
        Ok(content_length as f64 / 1024.0 / elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_measure_fast_channel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stream.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 51_200]))
            .mount(&server)
            .await;

        let tester = SpeedTester::new("test-agent", 5);
        let kbps = tester.measure(&format!("{}/stream.ts", server.uri())).await;
        // 50 KB served near-instantly: the 0.1s elapsed floor caps this at 500
        assert!(kbps > 0.3);
        assert!(kbps <= 500.0);
    }

    #[tokio::test]
    async fn test_measure_error_status_yields_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.ts"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tester = SpeedTester::new("test-agent", 5);
        let kbps = tester.measure(&format!("{}/gone.ts", server.uri())).await;
        assert_eq!(kbps, 0.0);
    }

    #[tokio::test]
    async fn test_measure_unreachable_yields_zero() {
        let tester = SpeedTester::new("test-agent", 1);
        let kbps = tester.measure("http://127.0.0.1:9/stream.ts").await;
        assert_eq!(kbps, 0.0);
    }
}
