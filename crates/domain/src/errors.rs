//! Error taxonomy for calls against the upstream dependency

use thiserror::Error;

use crate::event::EventAction;

/// Outcome classification for every guarded upstream call.
///
/// The call executor records [`ClientRejected`](UpstreamError::ClientRejected)
/// as a circuit breaker *success* (the dependency answered; the request was
/// bad) and everything else as a failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// The dependency rejected the request as invalid (4xx-style). Never
    /// retried and never queued for replay.
    #[error("upstream rejected request: {0}")]
    ClientRejected(String),

    /// The call failed for reasons attributable to the dependency or the
    /// transport: 5xx responses, connect failures, timeouts, malformed
    /// bodies.
    #[error("upstream call failed: {message}")]
    Internal {
        message: String,
        /// Product id the failed call concerned, when known
        id: Option<String>,
        /// Mutation the failed call was performing, when known
        action: Option<EventAction>,
    },

    /// The circuit breaker is open; the call was rejected without reaching
    /// the dependency.
    #[error("call not permitted: circuit breaker is open")]
    CallNotPermitted,
}

impl UpstreamError {
    /// Internal failure with no mutation context attached.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), id: None, action: None }
    }

    /// Internal failure enriched with the mutation it interrupted.
    pub fn internal_for(
        message: impl Into<String>,
        id: Option<String>,
        action: EventAction,
    ) -> Self {
        Self::Internal { message: message.into(), id, action: Some(action) }
    }

    /// True for errors the breaker must treat as a healthy-dependency
    /// outcome.
    pub const fn is_client_rejection(&self) -> bool {
        matches!(self, Self::ClientRejected(_))
    }

    /// True for failures that trigger the replay fallback on mutations.
    pub const fn is_guarded_failure(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::CallNotPermitted)
    }

    /// Product id attached to the failure, when known.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Internal { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    /// Mutation the failure interrupted, when known.
    pub const fn action(&self) -> Option<EventAction> {
        match self {
            Self::Internal { action, .. } => *action,
            _ => None,
        }
    }
}

/// Result type alias for upstream operations
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;
