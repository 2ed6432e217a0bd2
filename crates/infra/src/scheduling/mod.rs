//! Replay schedulers
//!
//! Two interval-based schedulers share one drain routine: the propagate
//! scheduler fans out successful local mutations, the reprocess scheduler
//! replays mutations that failed upstream. Both follow the same lifecycle
//! contract (start, stop, is_running) and cancel their background task on
//! drop.

pub mod error;
pub mod propagate_scheduler;
pub mod replay;
pub mod reprocess_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use propagate_scheduler::{PropagateScheduler, PropagateSchedulerConfig};
pub use replay::drain_queue;
pub use reprocess_scheduler::{ReprocessScheduler, ReprocessSchedulerConfig};
