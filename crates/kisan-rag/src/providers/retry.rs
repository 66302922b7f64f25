//! Bounded retry with a per-attempt timeout

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use crate::error::{Error, Result};

/// Retry policy for external model calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Limit on each attempt
    pub attempt_timeout: Duration,
    /// Delay before the first retry, doubled on each further retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_retries,
            attempt_timeout,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    /// Elapsed attempts become the error produced by `on_timeout`.
    pub async fn run<F, Fut, T>(
        &self,
        label: &str,
        on_timeout: fn(String) -> Error,
        operation: F,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match timeout(self.attempt_timeout, operation()).await {
                Ok(inner) => inner,
                Err(_) => Err(on_timeout(format!(
                    "{} timed out after {:?}",
                    label, self.attempt_timeout
                ))),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_transient() => {
                    let delay = self.base_delay * 2u32.pow(attempt - 1);
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label,
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
