//! Retry delay after a failed cycle.

use std::time::Duration;
use rand::Rng;

use crate::config::{RetryConfig, RetryStrategy};

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Delay policy consulted by the watcher between a failure and the next poll.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    strategy: RetryStrategy,
    base_ms: u64,
    max_ms: u64,
}

impl RetryPolicy {
    /// Always wait `delay`.
    pub fn fixed(delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        Self { strategy: RetryStrategy::Fixed, base_ms: ms, max_ms: ms }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            strategy: config.strategy,
            base_ms: config.base_delay_ms,
            max_ms: config.max_delay_ms,
        }
    }

    /// Delay before retrying after `consecutive_failures` (>= 1) failures.
    pub fn delay(&self, consecutive_failures: u32) -> Duration {
        match self.strategy {
            RetryStrategy::Fixed => Duration::from_millis(self.base_ms),
            RetryStrategy::Exponential => {
                calculate_backoff(consecutive_failures.max(1), self.base_ms, self.max_ms)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}
