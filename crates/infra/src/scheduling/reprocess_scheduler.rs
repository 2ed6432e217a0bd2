//! Reprocess scheduler for replaying failed upstream mutations
//!
//! Drains the retry queue on a longer interval than the propagate
//! scheduler; the queue only fills while the upstream is degraded, and a
//! slower cadence gives the circuit breaker room to recover between
//! replay waves. A replay that fails again re-enters the retry queue
//! through the call executor's fallback.

use std::sync::Arc;
use std::time::Duration;

use syncline_core::{EventQueue, UpstreamApi};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};
use crate::scheduling::replay::drain_queue;

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the reprocess scheduler
#[derive(Debug, Clone)]
pub struct ReprocessSchedulerConfig {
    /// Drain interval
    pub interval: Duration,
}

impl Default for ReprocessSchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(5) }
    }
}

/// Scheduler draining the retry queue
pub struct ReprocessScheduler {
    queue: Arc<EventQueue>,
    api: Arc<dyn UpstreamApi>,
    config: ReprocessSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ReprocessScheduler {
    /// Create a new reprocess scheduler
    ///
    /// # Arguments
    ///
    /// * `queue` - Retry event queue
    /// * `api` - Upstream product port
    /// * `config` - Scheduler configuration
    pub fn new(
        queue: Arc<EventQueue>,
        api: Arc<dyn UpstreamApi>,
        config: ReprocessSchedulerConfig,
    ) -> Self {
        Self {
            queue,
            api,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler
    ///
    /// Spawns a background task that drains the queue periodically.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!("Starting reprocess scheduler");

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let queue = Arc::clone(&self.queue);
        let api = Arc::clone(&self.api);
        let interval = self.config.interval;
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::drain_loop(queue, api, interval, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);

        info!("Reprocess scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping reprocess scheduler");

        // Cancel background task
        self.cancellation_token.cancel();

        // Await handle with timeout
        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Reprocess scheduler stopped");
        Ok(())
    }

    /// Check if scheduler is running
    ///
    /// A scheduler is considered running if it has an active task handle that
    /// hasn't finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Background drain loop
    async fn drain_loop(
        queue: Arc<EventQueue>,
        api: Arc<dyn UpstreamApi>,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Reprocess loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    drain_queue(&queue, &api, "reprocess").await;
                }
            }
        }
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for ReprocessScheduler {
    fn drop(&mut self) {
        // Note: Can't check task_handle (async), so check if token is not cancelled
        // This is best-effort cleanup in Drop
        if !self.cancellation_token.is_cancelled() {
            warn!("ReprocessScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use syncline_domain::{
        Event, EventAction, Product, ProductPatch, ProductPayload, ReplayReason, UpstreamResult,
    };

    use super::*;

    struct CountingApi {
        deletes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl UpstreamApi for CountingApi {
        async fn fetch_products(&self) -> UpstreamResult<Vec<Product>> {
            Ok(Vec::new())
        }

        async fn fetch_product(&self, product_id: &str) -> UpstreamResult<Product> {
            Ok(Product {
                id: product_id.to_string(),
                name: "widget".to_string(),
                price: 1.0,
                quantity: 1,
            })
        }

        async fn create_product(&self, payload: &ProductPayload) -> UpstreamResult<Product> {
            Ok(Product {
                id: "p-new".to_string(),
                name: payload.name.clone().unwrap_or_default(),
                price: payload.price.unwrap_or_default(),
                quantity: payload.quantity.unwrap_or_default(),
            })
        }

        async fn update_product(
            &self,
            _patch: &ProductPatch,
            product_id: &str,
        ) -> UpstreamResult<Product> {
            self.fetch_product(product_id).await
        }

        async fn delete_product(&self, _product_id: &str) -> UpstreamResult<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scheduler_lifecycle() {
        let queue = Arc::new(EventQueue::new());
        let api: Arc<dyn UpstreamApi> =
            Arc::new(CountingApi { deletes: Arc::new(AtomicUsize::new(0)) });
        let mut scheduler = ReprocessScheduler::new(
            queue,
            api,
            ReprocessSchedulerConfig { interval: Duration::from_secs(60) },
        );

        assert!(!scheduler.is_running());

        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());

        // Second start should fail
        assert!(scheduler.start().await.is_err());

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());

        // Stop when not running should fail
        assert!(scheduler.stop().await.is_err());
    }

    /// Validates that queued retry events are replayed on the next tick.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_scheduler_replays_retry_events() {
        let queue = Arc::new(EventQueue::new());
        let deletes = Arc::new(AtomicUsize::new(0));
        let api: Arc<dyn UpstreamApi> = Arc::new(CountingApi { deletes: Arc::clone(&deletes) });

        queue.push(Event::from_payload(
            &ProductPayload::for_delete("p-1"),
            EventAction::Delete,
            ReplayReason::Retry,
        ));

        let mut scheduler = ReprocessScheduler::new(
            Arc::clone(&queue),
            api,
            ReprocessSchedulerConfig { interval: Duration::from_millis(20) },
        );
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.stop().await.unwrap();

        assert!(queue.is_empty());
        assert_eq!(deletes.load(Ordering::SeqCst), 1);
    }
}
