//! Fixed-interval retry for transient upstream failures

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use parley_config::RetryConfig;

/// Attempt budget and fixed wait between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls, including the first; at least 1
    pub attempts: u32,
    /// Wait between attempts
    pub interval: Duration,
}

/// Passed to the before-sleep hook after a failed attempt
#[derive(Debug)]
pub struct RetryState<'a, E> {
    /// 1-based number of the attempt that just failed
    pub attempt: u32,
    /// Total attempts allowed
    pub max_attempts: u32,
    /// Error of the failed attempt
    pub error: &'a E,
    /// Wait before the next attempt
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    pub const fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.attempts, config.interval)
    }

    /// Run `operation` until it succeeds, fails permanently, or the budget runs out
    ///
    /// `before_sleep` is called once per retry, right before the wait. The
    /// final error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the last error of `operation`.
    pub async fn run<T, E, Op, Fut, Retryable, BeforeSleep>(
        &self,
        mut operation: Op,
        is_retryable: Retryable,
        mut before_sleep: BeforeSleep,
    ) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Retryable: Fn(&E) -> bool,
        BeforeSleep: FnMut(&RetryState<'_, E>),
    {
        let max_attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if attempt >= max_attempts || !is_retryable(&error) {
                return Err(error);
            }

            before_sleep(&RetryState {
                attempt,
                max_attempts,
                error: &error,
                delay: self.interval,
            });

            tokio::time::sleep(self.interval).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Default before-sleep hook
pub fn log_before_sleep<E: Display>(state: &RetryState<'_, E>) {
    tracing::warn!(
        attempt = state.attempt,
        max_attempts = state.max_attempts,
        delay_ms = u64::try_from(state.delay.as_millis()).unwrap_or(u64::MAX),
        error = %state.error,
        "upstream call failed, retrying"
    );
}
