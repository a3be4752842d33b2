//! Caller-side retry with exponential backoff
//!
//! The pipeline never retries on its own. Callers that want to re-run a
//! request after a transient completion failure or an unparseable reply wrap
//! the whole request in [`retry_request`].

use crate::completion::CompletionError;
use crate::error::{Error, Result};
use backoff::{backoff::Backoff, ExponentialBackoff};
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Whether to randomize delays
    pub jitter: bool,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Create an exponential backoff instance
    pub fn create_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            current_interval: self.base_delay,
            initial_interval: self.base_delay,
            max_interval: self.max_delay,
            multiplier: self.multiplier,
            max_elapsed_time: None,
            ..Default::default()
        };

        if !self.jitter {
            backoff.randomization_factor = 0.0;
        }

        backoff
    }
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    NoRetry,
}

/// Tracks retries for one logical request
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    retries: u32,
    backoff: ExponentialBackoff,
}

impl RetryHandler {
    pub fn new(policy: RetryPolicy) -> Self {
        let backoff = policy.create_backoff();
        Self {
            policy,
            retries: 0,
            backoff,
        }
    }

    /// Decide whether `error` warrants another attempt
    pub fn should_retry(&mut self, error: &Error) -> RetryDecision {
        if self.retries >= self.policy.max_retries || !error.is_retryable() {
            return RetryDecision::NoRetry;
        }

        self.retries += 1;
        RetryDecision::Retry {
            delay: self.calculate_delay(error),
        }
    }

    fn calculate_delay(&mut self, error: &Error) -> Duration {
        let delay = self
            .backoff
            .next_backoff()
            .unwrap_or(self.policy.max_delay)
            .min(self.policy.max_delay);

        // A rate limit's Retry-After is a floor, even above max_delay
        match error {
            Error::Completion(CompletionError {
                retry_after: Some(secs),
                ..
            }) => delay.max(Duration::from_secs(*secs)),
            _ => delay,
        }
    }

    /// Retries granted so far
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

/// Run `request` until it succeeds, fails permanently, or retries run out
pub async fn retry_request<F, Fut, T>(policy: &RetryPolicy, mut request: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut handler = RetryHandler::new(policy.clone());

    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(err) => match handler.should_retry(&err) {
                RetryDecision::Retry { delay } => {
                    warn!(
                        retry = handler.retries(),
                        delay_ms = delay.as_millis() as u64,
                        category = err.category(),
                        error = %err,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::NoRetry => {
                    error!(
                        retries = handler.retries(),
                        category = err.category(),
                        error = %err,
                        "Request failed, not retrying"
                    );
                    return Err(err);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
            .with_jitter(false)
    }

    fn server_error() -> Error {
        CompletionError::new(CompletionErrorKind::Server, "boom").into()
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert!(policy.jitter);
    }

    #[test]
    fn test_handler_respects_max_retries() {
        let mut handler = RetryHandler::new(fast_policy(2));
        assert!(matches!(handler.should_retry(&server_error()), RetryDecision::Retry { .. }));
        assert!(matches!(handler.should_retry(&server_error()), RetryDecision::Retry { .. }));
        assert_eq!(handler.should_retry(&server_error()), RetryDecision::NoRetry);
        assert_eq!(handler.retries(), 2);
    }

    #[test]
    fn test_validation_never_retried() {
        let mut handler = RetryHandler::new(fast_policy(5));
        let err = Error::Validation {
            message: "missing".to_string(),
            missing: vec!["patient_name".to_string()],
        };
        assert_eq!(handler.should_retry(&err), RetryDecision::NoRetry);
        assert_eq!(handler.retries(), 0);
    }

    #[test]
    fn test_retry_after_is_lower_bound() {
        let mut handler = RetryHandler::new(fast_policy(1));
        let mut err = CompletionError::new(CompletionErrorKind::RateLimited, "slow down");
        err.retry_after = Some(2);
        match handler.should_retry(&err.into()) {
            RetryDecision::Retry { delay } => assert_eq!(delay, Duration::from_secs(2)),
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let value = retry_request(&fast_policy(3), || async move {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::parse("no JSON", "prose"))
            } else {
                Ok("done")
            }
        })
        .await
        .unwrap();
        assert_eq!(value, "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<()> = retry_request(&fast_policy(2), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(server_error())
        })
        .await;
        assert!(matches!(result, Err(Error::Completion(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_missing_variable_fails_fast() {
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let result: Result<()> = retry_request(&fast_policy(3), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(Error::MissingVariable {
                name: "query".to_string(),
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
