//! Upstream product API adapter
//!
//! `UpstreamClient` is the raw HTTP surface: one method per endpoint,
//! mapping transport and status failures into the error taxonomy.
//! `UpstreamIntegration` layers the resilience semantics on top and
//! implements the `UpstreamApi` port.

pub mod client;
pub mod integration;

pub use client::{UpstreamClient, UpstreamClientConfig};
pub use integration::UpstreamIntegration;
