//! Document transport and request pacing.

use crate::error::{DataError, Result, TransportError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::trace;

/// Report page of the source; the request target is appended.
pub const DEFAULT_BASE_URL: &str = "https://www.google.com/finance?fstype=ii&q=";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser-like user agent; the source serves a reduced page to unknown clients.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

/// Anything that can turn a URL into raw document bytes.
///
/// Implementations report every failure (network, timeout, non-success
/// status) as a [`TransportError`] and never panic.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the body at `url`.
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError>;
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// URL prefix the request target is appended to
    pub base_url: String,
    /// User-Agent header
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Create a transport from explicit settings.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        if config.timeout_secs == 0 {
            return Err(DataError::Config("timeout_secs must be positive".to_string()));
        }
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(DataError::Network)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(url, &e))?;
        trace!(url, bytes = body.len(), "document received");
        Ok(body.to_vec())
    }
}

/// Spaces out request starts: at most one per `min_interval`.
///
/// Shared behind a mutex by every worker of a batch, so the limit holds
/// for the batch as a whole rather than per worker.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Option<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter; the first call to [`wait`](Self::wait) returns immediately.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_request: None,
            min_interval,
        }
    }

    /// Sleep until `min_interval` has passed since the previous start.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiting() {
        let mut limiter = RateLimiter::new(Duration::from_millis(200));

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        // two intervals between three starts
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_does_not_wait_after_idle() {
        let mut limiter = RateLimiter::new(Duration::from_millis(100));
        limiter.wait().await;
        sleep(Duration::from_millis(250)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);

        let partial: HttpConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(partial.timeout_secs, 5);
        assert_eq!(partial.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = HttpConfig {
            timeout_secs: 0,
            ..HttpConfig::default()
        };
        assert!(matches!(
            HttpTransport::with_config(&config),
            Err(DataError::Config(_))
        ));
    }
}
