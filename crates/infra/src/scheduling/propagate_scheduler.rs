//! Propagate scheduler for periodic fan-out of local mutations
//!
//! Drains the propagate queue on a short interval and pushes each event to
//! the upstream API. Fan-out events originate from successful local
//! mutations, so the queue is usually shallow and the interval is tight.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use syncline_core::{EventQueue, UpstreamApi};
//! use syncline_infra::scheduling::{PropagateScheduler, PropagateSchedulerConfig};
//!
//! # async fn example(api: Arc<dyn UpstreamApi>) -> Result<(), String> {
//! let queue = Arc::new(EventQueue::new());
//! let mut scheduler = PropagateScheduler::new(
//!     Arc::clone(&queue),
//!     api,
//!     PropagateSchedulerConfig { interval: Duration::from_secs(1) },
//! );
//!
//! scheduler.start().await.map_err(|e| e.to_string())?;
//! // ... application runs ...
//! scheduler.stop().await.map_err(|e| e.to_string())?;
//! # Ok(())
//! # }
//! ```

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

/// Configuration for the propagate scheduler
#[derive(Debug, Clone)]
pub struct PropagateSchedulerConfig {
    /// Drain interval
    pub interval: Duration,
}

impl Default for PropagateSchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(1) }
    }
}

/// Scheduler draining the propagate queue
pub struct PropagateScheduler {
    queue: Arc<EventQueue>,
    api: Arc<dyn UpstreamApi>,
    config: PropagateSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl PropagateScheduler {
    /// Create a new propagate scheduler
    ///
    /// # Arguments
    ///
    /// * `queue` - Propagate event queue
    /// * `api` - Upstream product port
    /// * `config` - Scheduler configuration
    pub fn new(
        queue: Arc<EventQueue>,
        api: Arc<dyn UpstreamApi>,
        config: PropagateSchedulerConfig,
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

        info!("Starting propagate scheduler");

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

        info!("Propagate scheduler started");
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

        info!("Stopping propagate scheduler");

        // Cancel background task
        self.cancellation_token.cancel();

        // Await handle with timeout
        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Propagate scheduler stopped");
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
                    debug!("Propagate loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    drain_queue(&queue, &api, "propagate").await;
                }
            }
        }
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for PropagateScheduler {
    fn drop(&mut self) {
        // Note: Can't check task_handle (async), so check if token is not cancelled
        // This is best-effort cleanup in Drop
        if !self.cancellation_token.is_cancelled() {
            warn!("PropagateScheduler dropped while running; cancelling");
            self.cancellation_token.cancel();
        }
    }
}
