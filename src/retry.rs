//! Bounded exponential backoff shared by the token manager and the bridge.

use std::time::Duration;

use crate::types::{AuthConfig, HttpConfig};

/// Attempt cap plus doubling delay with an upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first call included. Always >= 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    pub fn from_http(config: &HttpConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_base, config.backoff_max)
    }

    pub fn from_auth(config: &AuthConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_base, config.backoff_max)
    }

    /// Delay to wait after `completed` attempts have failed.
    ///
    /// `base * 2^(completed - 1)`, capped at `max_delay`.
    pub fn backoff(&self, completed: u32) -> Duration {
        let exponent = completed.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `completed` attempts.
    pub fn has_attempts_left(&self, completed: u32) -> bool {
        completed < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_http(&HttpConfig::default())
    }
}
