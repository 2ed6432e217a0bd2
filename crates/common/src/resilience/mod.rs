//! Resilience patterns for fault tolerance and error handling
//!
//! This module provides **generic, reusable** resilience patterns:
//! - **Circuit Breaker**: count-based sliding-window breaker that stops
//!   calling a dependency once its failure rate crosses a threshold
//! - **Retry Logic**: bounded fixed-backoff retry driven by a
//!   caller-supplied policy
//!
//! Both are generic over the caller's error type and carry no domain
//! knowledge; the classification of an error as a breaker failure or a
//! retryable condition is always the caller's decision.

pub mod circuit_breaker;
pub mod retry;

// Re-export circuit breaker types
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerMetrics,
    CircuitState, Clock, ConfigError, ConfigResult, MockClock, SystemClock,
};
// Re-export retry types
pub use retry::{
    policies, RetryConfig, RetryConfigBuilder, RetryExecutor, RetryPolicy,
};
