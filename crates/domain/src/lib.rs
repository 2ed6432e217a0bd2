//! # Syncline Domain
//!
//! Business domain types and models for Syncline.
//!
//! This crate contains:
//! - Product data types (Product, ProductPayload, ProductPatch)
//! - The immutable replication Event and its enums
//! - The upstream error taxonomy and Result definition
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Syncline crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod errors;
pub mod event;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use event::*;
pub use types::*;
