//! Composable retry policy with exponential backoff
//!
//! A [`RetryPolicy`] wraps one single-call async operation and replays it on
//! retryable classifications until the attempt cap is hit. Fatal errors
//! propagate immediately, and connection failures pass through untouched so
//! the pagination driver can restart the whole sequence.

use crate::config::ConnectorConfig;
use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy applied around each page request
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts before escalating to fatal
    pub max_attempts: u32,
    /// Exponential growth factor between attempts
    pub factor: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Ceiling on any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            factor: 2,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from the connector configuration
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            factor: config.backoff_factor,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.factor.saturating_pow(attempt.saturating_sub(1));
        std::cmp::min(self.initial_backoff.saturating_mul(exp), self.max_backoff)
    }

    /// Run `op` until it succeeds, fails fatally, or exhausts the attempt cap.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(Error::MaxRetriesExceeded {
                            max_retries: self.max_attempts,
                            last_error: e.to_string(),
                        });
                    }
                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying after retryable failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
