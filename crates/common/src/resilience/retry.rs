//! Bounded retry with fixed backoff
//!
//! The executor re-runs a fallible async operation until it succeeds, the
//! policy declares the error non-retryable, or the attempt budget is spent.
//! On exhaustion the **last** error is returned unchanged; the executor
//! never wraps the caller's error type. The backoff sleep is a plain
//! `tokio::time::sleep`, so dropping the surrounding future cancels the
//! wait.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::circuit_breaker::{ConfigError, ConfigResult};

/// Decides whether an error is worth another attempt.
///
/// Implemented by callers on their own error taxonomy; the executor itself
/// has no opinion about error kinds.
pub trait RetryPolicy<E>: Send + Sync {
    /// True when the failed attempt should be repeated.
    fn should_retry(&self, error: &E) -> bool;
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, backoff: Duration::from_millis(100) }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for RetryConfig
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.config.backoff = backoff;
        self
    }

    pub fn build(self) -> ConfigResult<RetryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Executes operations with bounded, policy-driven retries
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create an executor from a configuration and a policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// The configuration this executor was built with
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation`, retrying per the policy up to the attempt budget.
    ///
    /// Returns the first success, the first non-retryable error, or the
    /// last retryable error once the budget is spent.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: RetryPolicy<E>,
    {
        let mut attempt: u32 = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "Retry succeeded");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.policy.should_retry(&error) {
                        debug!(attempt, %error, "Error is not retryable, giving up");
                        return Err(error);
                    }
                    if attempt >= self.config.max_attempts {
                        warn!(
                            attempts = attempt,
                            %error,
                            "Retry budget exhausted, returning last error"
                        );
                        return Err(error);
                    }
                    debug!(attempt, %error, "Attempt failed, backing off before retry");
                    tokio::time::sleep(self.config.backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Ready-made policies for common cases
pub mod policies {
    use super::RetryPolicy;

    /// Retries every error
    #[derive(Debug, Clone, Copy, Default)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E) -> bool {
            true
        }
    }

    /// Never retries
    #[derive(Debug, Clone, Copy, Default)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E) -> bool {
            false
        }
    }

    /// Delegates the decision to a predicate
    #[derive(Debug, Clone)]
    pub struct PredicateRetry<F>(pub F);

    impl<E, F> RetryPolicy<E> for PredicateRetry<F>
    where
        F: Fn(&E) -> bool + Send + Sync,
    {
        fn should_retry(&self, error: &E) -> bool {
            (self.0)(error)
        }
    }
}
