//! # Syncline Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The replication event queues and notifiers
//! - Port/adapter interfaces (traits)
//! - The guarded call executor
//!
//! ## Architecture Principles
//! - Only depends on `syncline-common` and `syncline-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod replication;

// Re-export specific items to avoid ambiguity
pub use replication::executor::{CallExecutor, GuardedReadPolicy};
pub use replication::notifier::QueueNotifier;
pub use replication::ports::{ReplayNotifier, UpstreamApi};
pub use replication::queue::{EventQueue, ReplayQueues};
