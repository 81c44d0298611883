// Bounded retry with linear back-off for any fallible network operation

use std::error::Error as StdError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::classify;
use crate::error::UserFacingError;
use crate::reporter::{ErrorContext, ErrorReporter};

pub const RETRY_COMPONENT: &str = "API_RETRY";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Wait inserted after the given failed attempt (1-based): `base_delay * attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Runs an operation until it succeeds, fails permanently or runs out of attempts.
///
/// [`classify`] is consulted after each failure. Transient failures (network,
/// fetch, timeout, 502, 503) are retried until the attempt budget runs out;
/// anything else stops immediately. The caller only ever sees a
/// [`UserFacingError`]: the original error is reported and then dropped.
pub struct RetryExecutor {
    policy: RetryPolicy,
    reporter: Arc<ErrorReporter>,
}

impl RetryExecutor {
    pub fn new(reporter: Arc<ErrorReporter>, policy: RetryPolicy) -> Self {
        Self { policy, reporter }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, UserFacingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: StdError + Send + Sync + 'static,
    {
        self.execute_with(self.policy, operation).await
    }

    /// Same as [`RetryExecutor::execute`] with a per-call policy.
    pub async fn execute_with<T, E, F, Fut>(
        &self,
        policy: RetryPolicy,
        mut operation: F,
    ) -> Result<T, UserFacingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: StdError + Send + Sync + 'static,
    {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let message = err.to_string();
            let verdict = classify(&message);

            if !verdict.retryable || attempt >= max_attempts {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    retryable = verdict.retryable,
                    error = %message,
                    "operation failed, giving up"
                );
                self.reporter.log_error(
                    &err,
                    ErrorContext::new(RETRY_COMPONENT).with_action("exhausted"),
                );
                return Err(UserFacingError::from_internal(&message));
            }

            let delay = policy.delay_for(attempt);
            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %message,
                "transient error, retrying after back-off"
            );
            tokio::time::sleep(delay).await;
            self.reporter.log_error(
                &err,
                ErrorContext::new(RETRY_COMPONENT).with_action(format!("attempt {attempt}")),
            );
        }
    }
}
