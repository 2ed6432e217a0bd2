//! Replication pipeline services
//!
//! Everything between the application mutation path and the upstream HTTP
//! adapter: the event queues, the notifiers that feed them, the port
//! traits, and the guarded call executor.

pub mod executor;
pub mod notifier;
pub mod ports;
pub mod queue;

pub use executor::{CallExecutor, GuardedReadPolicy};
pub use notifier::QueueNotifier;
pub use ports::{ReplayNotifier, UpstreamApi};
pub use queue::{EventQueue, ReplayQueues};
