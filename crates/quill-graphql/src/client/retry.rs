//! When to repeat a failed query or mutation.
//!
//! Only transport failures and the statuses accepted by
//! [`is_retryable_status`] are retried. GraphQL-level errors (including id conflicts) are answers, not
//! failures, and go straight back to the caller.

use crate::client::{is_retryable_status, ClientConfig};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Each retry waits one second longer than the last, up to this.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(3),
        }
    }
}

impl RetryConfig {
    /// Single attempt, used for mutations.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn from_client(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.retry_delay_ms),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    Retry(Duration),
    DontRetry,
}

/// Attempt bookkeeping for one logical request.
#[derive(Debug, Clone)]
pub struct RetryState {
    pub attempts: u32,
    backoff: Duration,
    config: RetryConfig,
}

impl RetryState {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            attempts: 0,
            backoff: config.initial_backoff,
            config,
        }
    }

    /// `fatal` errors (bad input, conflicts, decode failures) are never retried.
    pub fn should_retry_error(&mut self, fatal: bool) -> RetryDecision {
        if fatal {
            return RetryDecision::DontRetry;
        }
        self.next_wait(None)
    }

    pub fn should_retry_status(&mut self, status: u16, retry_after: Option<Duration>) -> RetryDecision {
        if !is_retryable_status(status) {
            return RetryDecision::DontRetry;
        }
        self.next_wait(retry_after)
    }

    fn next_wait(&mut self, retry_after: Option<Duration>) -> RetryDecision {
        self.attempts += 1;
        if self.attempts > self.config.max_retries {
            return RetryDecision::DontRetry;
        }
        let wait = retry_after.unwrap_or(self.backoff);
        self.backoff = (self.backoff + Duration::from_secs(1)).min(self.config.max_backoff);
        RetryDecision::Retry(wait)
    }
}

/// `Retry-After` in its delta-seconds form. HTTP dates are ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
