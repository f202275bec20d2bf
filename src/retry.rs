//! Retry policy for operations that talk to a remote.
//!
//! Only the fetch step of building a tracking branch is retried. Everything
//! else subvend does is local and is expected to either work or fail for good.

use std::thread;
use std::time::Duration;

use log::warn;

use crate::defaults::{DEFAULT_FETCH_ATTEMPTS, DEFAULT_RATE_LIMIT_DELAY};
use crate::error::{Error, Result};
use crate::git::FailureKind;

/// How often, and how patiently, to retry a remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause before the next attempt when the remote reported rate limiting.
    /// Other failures are retried immediately.
    pub rate_limit_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, rate_limit_delay: Duration) -> Self {
        Self {
            max_attempts,
            rate_limit_delay,
        }
    }

    /// Run `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or the attempts are used up. The last error is returned.
    ///
    /// `operation` receives the 1-based attempt number.
    pub fn run<T>(
        &self,
        mut operation: impl FnMut(u32) -> Result<T>,
        is_retryable: impl Fn(&Error) -> bool,
    ) -> Result<T> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && is_retryable(&err) => {
                    warn!(
                        "Attempt {} of {} failed: {}; retrying",
                        attempt, max_attempts, err
                    );
                    if is_rate_limited(&err) && !self.rate_limit_delay.is_zero() {
                        thread::sleep(self.rate_limit_delay);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_ATTEMPTS, DEFAULT_RATE_LIMIT_DELAY)
    }
}

/// Retry `operation` up to `max_attempts` times while `is_retryable` holds,
/// without pausing between attempts.
pub fn retry<T>(
    operation: impl FnMut(u32) -> Result<T>,
    max_attempts: u32,
    is_retryable: impl Fn(&Error) -> bool,
) -> Result<T> {
    RetryPolicy::new(max_attempts, Duration::ZERO).run(operation, is_retryable)
}

/// Failures of a git invocation are worth retrying; a missing git binary or
/// a local I/O problem is not.
pub fn is_transient(err: &Error) -> bool {
    matches!(err, Error::Execution { .. })
}

fn is_rate_limited(err: &Error) -> bool {
    match err {
        Error::Execution { stderr, .. } => FailureKind::classify(stderr) == FailureKind::RateLimited,
        _ => false,
    }
}
