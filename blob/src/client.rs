//! HTTP client with bounded retries
//!
//! One client is built per resolved configuration and shared by every
//! upload task. Transport errors, 429 and 5xx responses are retried with
//! exponential backoff and jitter; all other statuses are returned to the
//! caller for protocol-level handling.

use std::time::Duration;

use rand::Rng;
use common::TransferError;

/// Retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 4;

const BASE_BACKOFF_MS: u64 = 250;

#[derive(Debug, Clone)]
pub struct RetryClient {
    http: reqwest::Client,
    retries: u32,
}

impl RetryClient {
    pub fn new(timeout: Duration) -> Result<Self, TransferError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransferError::Network(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            retries: DEFAULT_RETRIES,
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Sends `request`, retrying transient failures up to the configured
    /// limit. The request body must be cloneable (buffered, not streamed).
    pub async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response, TransferError> {
        let mut last_failure = String::new();
        for attempt in 0..=self.retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                tracing::debug!(
                    "retrying {} {} (attempt {}/{}) after {:?}: {}",
                    request.method(),
                    request.url(),
                    attempt,
                    self.retries,
                    delay,
                    last_failure
                );
                tokio::time::sleep(delay).await;
            }
            let cloned = request.try_clone().ok_or_else(|| {
                TransferError::Network("request body is not retryable".to_string())
            })?;
            match self.http.execute(cloned).await {
                Ok(response) if retryable_status(response.status()) => {
                    last_failure = format!("status {}", response.status());
                }
                Ok(response) => return Ok(response),
                Err(err) => {
                    last_failure = err.to_string();
                }
            }
        }
        Err(TransferError::Network(format!(
            "{} {} failed after {} attempts: {}",
            request.method(),
            request.url(),
            self.retries + 1,
            last_failure
        )))
    }
}

fn retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp = BASE_BACKOFF_MS * 2u64.saturating_pow(attempt - 1);
    let jitter = rand::thread_rng().gen_range(0..=exp / 2);
    Duration::from_millis(exp + jitter)
}
