//! # Syncline Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The HTTP client and integration for the upstream product API
//! - The propagate and reprocess replay schedulers
//! - The configuration loader
//! - The pipeline wiring helper
//!
//! ## Architecture
//! - Implements traits defined in `syncline-core`
//! - Depends on `syncline-common`, `syncline-domain`, `syncline-core`
//! - Contains all "impure" code (I/O, timers, environment)

pub mod config;
pub mod pipeline;
pub mod scheduling;
pub mod upstream;

// Re-export commonly used items
pub use pipeline::{PipelineError, ReplicationPipeline};
pub use scheduling::{
    PropagateScheduler, PropagateSchedulerConfig, ReprocessScheduler, ReprocessSchedulerConfig,
    SchedulerError, SchedulerResult,
};
pub use upstream::{UpstreamClient, UpstreamClientConfig, UpstreamIntegration};
