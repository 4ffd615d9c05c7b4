use std::future::Future;
use std::time::Duration;

use crate::persistence::error::ApiError;

/// Retries after the first call, waiting 1s, 2s and 4s
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Exponential backoff for remote writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first call
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2*base, 4*base, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// Run `op` until it succeeds, fails permanently or runs out of retries
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_retryable() => {
                    log::error!("{label} failed permanently: {error}");
                    return Err(error);
                }
                Err(error) if retry >= self.max_retries => {
                    log::error!("{label} failed after {} attempts: {error}", retry + 1);
                    return Err(error);
                }
                Err(error) => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    log::warn!(
                        "{label} failed, retry {retry}/{} in {delay:?}: {error}",
                        self.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY)
    }
}
