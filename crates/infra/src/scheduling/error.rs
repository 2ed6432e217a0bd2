//! Error types for scheduler operations

use std::time::Duration;

use thiserror::Error;

/// Errors from scheduler lifecycle operations
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Scheduler is already running
    #[error("Scheduler is already running")]
    AlreadyRunning,

    /// Scheduler is not running
    #[error("Scheduler is not running")]
    NotRunning,

    /// Operation timed out
    #[error("Scheduler operation timed out after {duration:?}")]
    Timeout {
        duration: Duration,
        #[source]
        source: tokio::time::error::Elapsed,
    },

    /// Background task failed to join
    #[error("Scheduler task failed: {0}")]
    TaskJoinFailed(String),
}

impl From<tokio::task::JoinError> for SchedulerError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::TaskJoinFailed(error.to_string())
    }
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
