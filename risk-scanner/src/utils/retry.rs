use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::rules::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    pub fn never() -> Self {
        RetryPolicy {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

/// Runs `action` until it succeeds, fails with a terminal error, or `max_attempts` is
/// used up. Only errors where [`crate::Error::is_recoverable`] holds are retried.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut action: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match action().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_recoverable() && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed, retrying in {:?} (attempt {}/{}): {}",
                    operation,
                    delay,
                    attempt + 1,
                    attempts,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                debug!("{} gave up after {} attempt(s)", operation, attempt + 1);
                return Err(err);
            }
        }
    }
}
