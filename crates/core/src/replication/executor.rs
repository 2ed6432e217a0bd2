//! Guarded call execution
//!
//! `CallExecutor` wraps every outbound upstream operation with the circuit
//! breaker and maps operation outcomes to breaker outcomes: a client-side
//! rejection counts as a breaker *success* because the dependency answered,
//! while internal failures count against the failure window. Reads get an
//! additional bounded retry around the guard (so a breaker rejection
//! consumes a retry attempt); mutations get the replay fallback instead,
//! which captures the snapshot as a retry event and re-raises an enriched
//! error.

use std::future::Future;
use std::sync::Arc;

use syncline_common::resilience::{
    CircuitBreaker, Clock, RetryConfig, RetryExecutor, RetryPolicy, SystemClock,
};
use syncline_domain::{EventAction, ProductPayload, UpstreamError, UpstreamResult};
use tracing::{debug, warn};

use super::ports::ReplayNotifier;

/// Retry policy for guarded reads: everything but a client rejection is
/// worth another attempt, including breaker rejections (the breaker may
/// have moved to half-open by the next attempt).
#[derive(Debug, Clone, Copy, Default)]
pub struct GuardedReadPolicy;

impl RetryPolicy<UpstreamError> for GuardedReadPolicy {
    fn should_retry(&self, error: &UpstreamError) -> bool {
        !error.is_client_rejection()
    }
}

/// Orchestrates breaker, retry, and replay-fallback around upstream calls
pub struct CallExecutor<C: Clock = SystemClock> {
    breaker: CircuitBreaker<C>,
    retry: RetryExecutor<GuardedReadPolicy>,
    retry_notifier: Arc<dyn ReplayNotifier>,
}

impl<C: Clock> CallExecutor<C> {
    /// Build an executor around a breaker, a retry configuration for the
    /// read path, and the notifier feeding the retry queue.
    pub fn new(
        breaker: CircuitBreaker<C>,
        retry_config: RetryConfig,
        retry_notifier: Arc<dyn ReplayNotifier>,
    ) -> Self {
        Self { breaker, retry: RetryExecutor::new(retry_config, GuardedReadPolicy), retry_notifier }
    }

    /// The breaker guarding this executor's calls
    pub const fn breaker(&self) -> &CircuitBreaker<C> {
        &self.breaker
    }

    /// Run one operation under the breaker guard.
    ///
    /// Rejected acquisitions fail with
    /// [`UpstreamError::CallNotPermitted`] without invoking the operation.
    /// The operation's own result is propagated unchanged.
    pub async fn execute_guarded<T, F, Fut>(&self, operation: F) -> UpstreamResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = UpstreamResult<T>>,
    {
        self.guarded(&operation).await
    }

    /// Run an idempotent read under the breaker guard with bounded
    /// retries. Client rejections are attempted exactly once; internal
    /// failures and breaker rejections are retried up to the configured
    /// attempt budget, after which the last failure is returned.
    pub async fn execute_guarded_read<T, F, Fut>(&self, operation: F) -> UpstreamResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = UpstreamResult<T>>,
    {
        self.retry.execute(|| self.guarded(&operation)).await
    }

    /// Run a mutation under the breaker guard with the replay fallback.
    ///
    /// On an internal failure or a breaker rejection, exactly one retry
    /// event carrying `snapshot` and `action` is queued, and the call fails
    /// with an internal error enriched with the snapshot id and the action.
    /// Client rejections propagate unchanged and queue nothing; replaying
    /// an invalid request would only fail the same way again.
    pub async fn execute_guarded_with_fallback<T, F, Fut>(
        &self,
        operation: F,
        snapshot: &ProductPayload,
        action: EventAction,
    ) -> UpstreamResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = UpstreamResult<T>>,
    {
        match self.guarded(&operation).await {
            Ok(value) => Ok(value),
            Err(error) if error.is_guarded_failure() => {
                warn!(%action, id = snapshot.id.as_deref(), %error, "Guarded mutation failed, queueing retry event");
                self.retry_notifier.notify(snapshot, action);
                Err(UpstreamError::internal_for(
                    format!("{action} was queued for automatic replay: {error}"),
                    snapshot.id.clone(),
                    action,
                ))
            }
            Err(error) => Err(error),
        }
    }

    async fn guarded<T, F, Fut>(&self, operation: &F) -> UpstreamResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = UpstreamResult<T>>,
    {
        if !self.breaker.try_acquire() {
            return Err(UpstreamError::CallNotPermitted);
        }

        match operation().await {
            Ok(value) => {
                self.breaker.record_success();
                Ok(value)
            }
            Err(error) if error.is_client_rejection() => {
                // The dependency answered; only the request was bad
                debug!(%error, "Client rejection, recorded as breaker success");
                self.breaker.record_success();
                Err(error)
            }
            Err(error) => {
                self.breaker.record_failure();
                Err(error)
            }
        }
    }
}
