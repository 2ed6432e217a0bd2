//! End-to-end pipeline wiring
//!
//! `ReplicationPipeline` assembles the whole propagation stack from one
//! [`Config`]: breaker, call executor, HTTP client, upstream integration,
//! queues, notifiers, and both replay schedulers. Applications construct
//! it once at startup, call [`start`](ReplicationPipeline::start), and
//! talk to the upstream through [`api`](ReplicationPipeline::api).

use std::sync::Arc;

use syncline_common::resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, RetryConfig,
};
use syncline_core::{CallExecutor, QueueNotifier, ReplayQueues, UpstreamApi};
use syncline_domain::{Config, UpstreamError};
use thiserror::Error;
use tracing::info;

use crate::scheduling::{
    PropagateScheduler, PropagateSchedulerConfig, ReprocessScheduler, ReprocessSchedulerConfig,
    SchedulerError,
};
use crate::upstream::{UpstreamClient, UpstreamClientConfig, UpstreamIntegration};

/// Errors from pipeline assembly and lifecycle
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration failed validation
    #[error("invalid configuration: {0}")]
    Config(#[from] syncline_domain::ConfigError),

    /// Breaker configuration failed validation
    #[error("invalid breaker configuration: {0}")]
    Breaker(#[from] syncline_common::resilience::ConfigError),

    /// The HTTP client could not be initialized
    #[error("failed to initialize upstream client: {0}")]
    Upstream(#[from] UpstreamError),

    /// A scheduler lifecycle operation failed
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// The assembled propagation pipeline
pub struct ReplicationPipeline {
    queues: ReplayQueues,
    breaker: CircuitBreaker,
    api: Arc<dyn UpstreamApi>,
    propagate_notifier: QueueNotifier,
    propagate_scheduler: PropagateScheduler,
    reprocess_scheduler: ReprocessScheduler,
}

impl ReplicationPipeline {
    /// Wire the full pipeline from a validated configuration.
    ///
    /// # Errors
    /// Returns [`PipelineError`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        config.validate()?;

        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            window_size: config.breaker.window_size,
            failure_rate_threshold: config.breaker.failure_rate_threshold,
            wait_duration_in_open: config.breaker.wait_duration_in_open(),
            permitted_calls_in_half_open: config.breaker.permitted_calls_in_half_open,
        })?;

        let queues = ReplayQueues::new();
        let retry_notifier = Arc::new(QueueNotifier::retry(Arc::clone(&queues.retry)));
        let propagate_notifier = QueueNotifier::propagate(Arc::clone(&queues.propagate));

        let executor = Arc::new(CallExecutor::new(
            breaker.clone(),
            RetryConfig {
                max_attempts: config.retry.max_attempts,
                backoff: config.retry.backoff(),
            },
            retry_notifier,
        ));

        let client = Arc::new(UpstreamClient::new(UpstreamClientConfig::from(&config.upstream))?);
        let api: Arc<dyn UpstreamApi> = Arc::new(UpstreamIntegration::new(client, executor));

        let propagate_scheduler = PropagateScheduler::new(
            Arc::clone(&queues.propagate),
            Arc::clone(&api),
            PropagateSchedulerConfig { interval: config.schedulers.propagate_interval() },
        );
        let reprocess_scheduler = ReprocessScheduler::new(
            Arc::clone(&queues.retry),
            Arc::clone(&api),
            ReprocessSchedulerConfig { interval: config.schedulers.reprocess_interval() },
        );

        Ok(Self {
            queues,
            breaker,
            api,
            propagate_notifier,
            propagate_scheduler,
            reprocess_scheduler,
        })
    }

    /// The guarded upstream port applications call through
    pub fn api(&self) -> Arc<dyn UpstreamApi> {
        Arc::clone(&self.api)
    }

    /// The pipeline's event queues
    pub const fn queues(&self) -> &ReplayQueues {
        &self.queues
    }

    /// Notifier recording confirmed local mutations for fan-out
    pub const fn propagate_notifier(&self) -> &QueueNotifier {
        &self.propagate_notifier
    }

    /// Current breaker metrics snapshot
    pub fn breaker_metrics(&self) -> CircuitBreakerMetrics {
        self.breaker.metrics()
    }

    /// Start both replay schedulers.
    ///
    /// # Errors
    /// Returns [`PipelineError::Scheduler`] if a scheduler is already
    /// running.
    pub async fn start(&mut self) -> Result<(), PipelineError> {
        info!("Starting replication pipeline");
        self.propagate_scheduler.start().await?;
        self.reprocess_scheduler.start().await?;
        Ok(())
    }

    /// Stop both replay schedulers gracefully.
    ///
    /// # Errors
    /// Returns [`PipelineError::Scheduler`] if a scheduler is not running
    /// or fails to join.
    pub async fn shutdown(&mut self) -> Result<(), PipelineError> {
        info!("Stopping replication pipeline");
        self.propagate_scheduler.stop().await?;
        self.reprocess_scheduler.stop().await?;
        Ok(())
    }

    /// True while both schedulers are running
    pub fn is_running(&self) -> bool {
        self.propagate_scheduler.is_running() && self.reprocess_scheduler.is_running()
    }
}

#[cfg(test)]
mod tests {
    use syncline_common::resilience::CircuitState;

    use super::*;

    /// Validates assembly from the default configuration.
    #[test]
    fn test_from_config_defaults() {
        let pipeline = ReplicationPipeline::from_config(&Config::default()).unwrap();
        assert!(pipeline.queues().propagate.is_empty());
        assert!(pipeline.queues().retry.is_empty());
        assert_eq!(pipeline.breaker_metrics().state, CircuitState::Closed);
        assert!(!pipeline.is_running());
    }

    /// Validates that an invalid configuration is rejected at assembly.
    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = Config::default();
        config.breaker.window_size = 0;
        assert!(matches!(
            ReplicationPipeline::from_config(&config),
            Err(PipelineError::Config(_))
        ));
    }

    /// Validates the scheduler lifecycle through the pipeline facade.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_pipeline_lifecycle() {
        let mut pipeline = ReplicationPipeline::from_config(&Config::default()).unwrap();

        pipeline.start().await.unwrap();
        assert!(pipeline.is_running());

        // Second start should fail
        assert!(pipeline.start().await.is_err());

        pipeline.shutdown().await.unwrap();
        assert!(!pipeline.is_running());
    }
}
