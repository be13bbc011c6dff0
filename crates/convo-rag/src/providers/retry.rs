//! Timeout and bounded retry with exponential backoff for collaborator calls

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::ResilienceConfig;
use crate::error::{Error, Result};

/// Retry policy shared by every external call
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Deadline for each attempt
    pub request_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff(),
            request_timeout: config.request_timeout(),
        }
    }

    /// Single attempt, no retries
    pub fn no_retry(request_timeout: Duration) -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            request_timeout,
        }
    }

    /// Delay before retry number `retry` (1-based)
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Run `operation` under the policy
    ///
    /// Each attempt is bounded by `request_timeout`. Transient failures are
    /// retried up to `max_retries` times; once they run out the last failure
    /// is reported as `Error::UpstreamUnavailable`. Non-transient failures
    /// are returned unchanged on the first occurrence.
    pub async fn run<F, Fut, T>(&self, service: &'static str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = match timeout(self.request_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    service,
                    after: self.request_timeout,
                }),
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => err,
            };

            if attempt >= attempts {
                return Err(Error::UpstreamUnavailable {
                    service,
                    attempts,
                    last_error: err.to_string(),
                });
            }

            let delay = self.backoff(attempt);
            tracing::warn!(
                "{} request failed (attempt {}/{}): {}; retrying in {:?}",
                service,
                attempt,
                attempts,
                err,
                delay
            );
            sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ResilienceConfig::default())
    }
}
