//! Configuration structures for the replication pipeline
//!
//! All values are fixed for the lifetime of the process; the loader in the
//! infra crate fills them from environment variables or a TOML file.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid { message: message.into() }
    }
}

/// Top-level configuration for the replication pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamSettings,
    pub breaker: BreakerSettings,
    pub retry: RetrySettings,
    pub schedulers: SchedulerSettings,
}

impl Config {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.upstream.validate()?;
        self.breaker.validate()?;
        self.retry.validate()?;
        self.schedulers.validate()
    }
}

/// Connection settings for the upstream dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Base URL of the upstream service
    pub base_url: String,
    /// Resource path appended to the base URL
    pub resource_path: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            resource_path: "/products".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl UpstreamSettings {
    /// Per-request timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::invalid("upstream.base_url must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("upstream.request_timeout_secs must be greater than 0"));
        }
        Ok(())
    }
}

/// Circuit breaker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    /// Sliding window size in calls
    pub window_size: usize,
    /// Failure rate (percent of the window) that opens the breaker
    pub failure_rate_threshold: f32,
    /// Seconds to stay open before probing
    pub wait_duration_in_open_secs: u64,
    /// Probe calls admitted while half-open
    pub permitted_calls_in_half_open: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            window_size: 10,
            failure_rate_threshold: 70.0,
            wait_duration_in_open_secs: 10,
            permitted_calls_in_half_open: 4,
        }
    }
}

impl BreakerSettings {
    /// Open-state wait as a [`Duration`].
    pub const fn wait_duration_in_open(&self) -> Duration {
        Duration::from_secs(self.wait_duration_in_open_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::invalid("breaker.window_size must be greater than 0"));
        }
        if !(0.0..=100.0).contains(&self.failure_rate_threshold)
            || self.failure_rate_threshold == 0.0
        {
            return Err(ConfigError::invalid(
                "breaker.failure_rate_threshold must be in (0, 100]",
            ));
        }
        if self.permitted_calls_in_half_open == 0 {
            return Err(ConfigError::invalid(
                "breaker.permitted_calls_in_half_open must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Retry settings for idempotent read calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts, in milliseconds
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_ms: 100 }
    }
}

impl RetrySettings {
    /// Fixed backoff as a [`Duration`].
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts must be greater than 0"));
        }
        Ok(())
    }
}

/// Tick periods for the replay schedulers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Seconds between propagate queue drains
    pub propagate_interval_secs: u64,
    /// Seconds between retry queue drains
    pub reprocess_interval_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { propagate_interval_secs: 1, reprocess_interval_secs: 5 }
    }
}

impl SchedulerSettings {
    /// Propagate drain period as a [`Duration`].
    pub const fn propagate_interval(&self) -> Duration {
        Duration::from_secs(self.propagate_interval_secs)
    }

    /// Reprocess drain period as a [`Duration`].
    pub const fn reprocess_interval(&self) -> Duration {
        Duration::from_secs(self.reprocess_interval_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.propagate_interval_secs == 0 || self.reprocess_interval_secs == 0 {
            return Err(ConfigError::invalid("scheduler intervals must be greater than 0"));
        }
        Ok(())
    }
}
