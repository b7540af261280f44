//! Exponential backoff for reconciliation retries.

use std::time::Duration;

use rig_config::SyncConfig;

/// Capped exponential backoff with a bounded retry count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub max: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

impl BackoffPolicy {
    #[must_use]
    pub const fn from_config(config: &SyncConfig) -> Self {
        Self {
            base: config.backoff_base(),
            max: config.backoff_max(),
            max_retries: config.max_retries,
        }
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
    /// capped at `max`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Whether another retry is allowed after `retries_done` retries.
    #[must_use]
    pub const fn allows_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }
}
