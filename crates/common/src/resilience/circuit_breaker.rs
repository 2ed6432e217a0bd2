//! Count-based sliding-window circuit breaker
//!
//! The breaker watches the outcomes of the last `window_size` permitted
//! calls and opens once the failure rate crosses a configured threshold.
//! While open it rejects calls without touching the dependency; after a
//! configured wait it admits a limited number of half-open probes and
//! either closes again or reopens. There is no background timer: the
//! open-to-half-open transition happens lazily on the next acquisition.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

//==============================================================================
// Time Abstraction for Testability
//==============================================================================

/// Trait for time operations to enable deterministic testing
///
/// This trait allows circuit breakers to use real system time in production
/// and controlled mock time in tests, enabling deterministic testing of
/// wait-duration behavior without actual delays.
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient cloning
impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Mock clock for deterministic testing
///
/// Allows tests to control time progression without actual delays.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current instant
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Advance the mock clock by seconds (convenience method)
    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }
}

//==============================================================================
// Error Types
//==============================================================================

/// Simple configuration error for validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Circuit is half-open, allowing limited probe requests
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of call outcomes kept in the sliding window
    pub window_size: usize,
    /// Failure rate, as a percentage of the window size, that opens the
    /// circuit. The rate is evaluated after every recorded outcome, so a
    /// burst of failures can open the circuit before the window first
    /// fills.
    pub failure_rate_threshold: f32,
    /// Time to wait before transitioning from open to half-open
    pub wait_duration_in_open: Duration,
    /// Number of probe calls admitted in half-open state
    pub permitted_calls_in_half_open: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            failure_rate_threshold: 70.0,
            wait_duration_in_open: Duration::from_secs(10),
            permitted_calls_in_half_open: 4,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.window_size == 0 {
            return Err(ConfigError::Invalid {
                message: "window_size must be greater than 0".to_string(),
            });
        }

        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 100.0) {
            return Err(ConfigError::Invalid {
                message: "failure_rate_threshold must be in (0, 100]".to_string(),
            });
        }

        if self.permitted_calls_in_half_open == 0 {
            return Err(ConfigError::Invalid {
                message: "permitted_calls_in_half_open must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self { config: CircuitBreakerConfig::default() }
    }

    pub fn window_size(mut self, size: usize) -> Self {
        self.config.window_size = size;
        self
    }

    pub fn failure_rate_threshold(mut self, threshold: f32) -> Self {
        self.config.failure_rate_threshold = threshold;
        self
    }

    pub fn wait_duration_in_open(mut self, wait: Duration) -> Self {
        self.config.wait_duration_in_open = wait;
        self
    }

    pub fn permitted_calls_in_half_open(mut self, calls: u32) -> Self {
        self.config.permitted_calls_in_half_open = calls;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Circuit breaker metrics for monitoring
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    pub failures_in_window: usize,
    pub calls_in_window: usize,
    pub failure_rate: f32,
    pub permitted_calls: u64,
    pub rejected_calls: u64,
}

/// Everything the state machine mutates lives under one lock so that
/// recording an outcome and the transition it causes are a single atomic
/// step.
struct BreakerInner {
    state: CircuitState,
    /// Ring of recent outcomes; `true` marks a failure
    window: VecDeque<bool>,
    failures_in_window: usize,
    opened_at: Option<Instant>,
    half_open_issued: u32,
    half_open_successes: u32,
    permitted_calls: u64,
    rejected_calls: u64,
}

impl BreakerInner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            window: VecDeque::new(),
            failures_in_window: 0,
            opened_at: None,
            half_open_issued: 0,
            half_open_successes: 0,
            permitted_calls: 0,
            rejected_calls: 0,
        }
    }

    /// Append one outcome, evicting the oldest once the window is full.
    fn record_outcome(&mut self, failed: bool, window_size: usize) {
        if self.window.len() == window_size {
            if let Some(evicted) = self.window.pop_front() {
                if evicted {
                    self.failures_in_window -= 1;
                }
            }
        }
        self.window.push_back(failed);
        if failed {
            self.failures_in_window += 1;
        }
    }

    /// Failure rate over the window capacity, not the filled length.
    #[allow(clippy::cast_precision_loss)]
    fn failure_rate(&self, window_size: usize) -> f32 {
        self.failures_in_window as f32 / window_size as f32 * 100.0
    }

    fn trip_open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.half_open_issued = 0;
        self.half_open_successes = 0;
    }

    fn close(&mut self) {
        self.state = CircuitState::Closed;
        self.window.clear();
        self.failures_in_window = 0;
        self.opened_at = None;
        self.half_open_issued = 0;
        self.half_open_successes = 0;
    }
}

/// Sliding-window circuit breaker
///
/// Cheap to clone; clones share the same underlying state. Callers drive it
/// through [`try_acquire`](Self::try_acquire) before an operation and
/// [`record_success`](Self::record_success) /
/// [`record_failure`](Self::record_failure) after, which keeps the mapping
/// from operation outcome to breaker outcome in the caller's hands.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    inner: Arc<Mutex<BreakerInner>>,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &inner.state)
            .field("failures_in_window", &inner.failures_in_window)
            .finish()
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            inner: Arc::clone(&self.inner),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a new circuit breaker with the given configuration using the
    /// system clock
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a new circuit breaker with a custom clock (useful for testing)
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(BreakerInner::new())),
            clock: Arc::new(clock),
        })
    }

    /// Ask the breaker to admit one call.
    ///
    /// Returns `false` while the circuit is open and the wait duration has
    /// not elapsed, or when the half-open probe budget is spent. Returns
    /// `true` otherwise; a `true` from an open circuit means the breaker
    /// just transitioned to half-open and this call is the first probe.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.permitted_calls += 1;
                true
            }
            CircuitState::Open => {
                let waited_out = inner
                    .opened_at
                    .is_some_and(|at| self.clock.now().duration_since(at) >= self.config.wait_duration_in_open);
                if waited_out {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_issued = 1;
                    inner.half_open_successes = 0;
                    inner.permitted_calls += 1;
                    info!("Circuit breaker transitioning OPEN -> HALF_OPEN, admitting first probe");
                    true
                } else {
                    inner.rejected_calls += 1;
                    debug!("Circuit breaker rejecting call, state: OPEN");
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.half_open_issued < self.config.permitted_calls_in_half_open {
                    inner.half_open_issued += 1;
                    inner.permitted_calls += 1;
                    true
                } else {
                    inner.rejected_calls += 1;
                    debug!("Circuit breaker rejecting call, half-open probe budget spent");
                    false
                }
            }
        }
    }

    /// Record a successful outcome for a previously admitted call
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.record_outcome(false, self.config.window_size);
            }
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.permitted_calls_in_half_open {
                    inner.close();
                    info!(
                        "Circuit breaker closed after {} successful probes",
                        self.config.permitted_calls_in_half_open
                    );
                }
            }
            // Result of a call admitted before a reopen; nothing to update
            CircuitState::Open => {}
        }
    }

    /// Record a failed outcome for a previously admitted call
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        match inner.state {
            CircuitState::Closed => {
                inner.record_outcome(true, self.config.window_size);
                let rate = inner.failure_rate(self.config.window_size);
                if rate >= self.config.failure_rate_threshold {
                    inner.trip_open(now);
                    warn!(
                        failure_rate = rate,
                        threshold = self.config.failure_rate_threshold,
                        "Circuit breaker opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                inner.trip_open(now);
                warn!("Circuit breaker reopened after failed half-open probe");
            }
            CircuitState::Open => {}
        }
    }

    /// Get the current state of the circuit breaker
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Get a metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        CircuitBreakerMetrics {
            state: inner.state,
            failures_in_window: inner.failures_in_window,
            calls_in_window: inner.window.len(),
            failure_rate: inner.failure_rate(self.config.window_size),
            permitted_calls: inner.permitted_calls,
            rejected_calls: inner.rejected_calls,
        }
    }

    /// Reset the circuit breaker to the closed state, clearing the window
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.close();
        info!("Circuit breaker manually reset to closed state");
    }

    /// The configuration this breaker was built with
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl Default for CircuitBreaker<SystemClock> {
    fn default() -> Self {
        Self {
            config: CircuitBreakerConfig::default(),
            inner: Arc::new(Mutex::new(BreakerInner::new())),
            clock: Arc::new(SystemClock),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the sliding-window circuit breaker
    //!
    //! Tests cover configuration validation, the failure-rate trip
    //! condition, the lazy open-to-half-open transition, half-open probe
    //! accounting, and concurrent access.

    use super::*;

    fn test_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            window_size: 10,
            failure_rate_threshold: 70.0,
            wait_duration_in_open: Duration::from_secs(10),
            permitted_calls_in_half_open: 4,
        }
    }

    fn breaker_with_mock_clock() -> (CircuitBreaker<MockClock>, MockClock) {
        let clock = MockClock::new();
        let breaker = CircuitBreaker::with_clock(test_config(), clock.clone()).unwrap();
        (breaker, clock)
    }

    /// Validates `CircuitState` display rendering.
    ///
    /// Assertions:
    /// - Confirms `CircuitState::Closed.to_string()` equals `"CLOSED"`.
    /// - Confirms `CircuitState::Open.to_string()` equals `"OPEN"`.
    /// - Confirms `CircuitState::HalfOpen.to_string()` equals `"HALF_OPEN"`.
    #[test]
    fn test_circuit_state_display() {
        assert_eq!(CircuitState::Closed.to_string(), "CLOSED");
        assert_eq!(CircuitState::Open.to_string(), "OPEN");
        assert_eq!(CircuitState::HalfOpen.to_string(), "HALF_OPEN");
    }

    /// Validates `CircuitBreakerConfig::default` values.
    #[test]
    fn test_config_default() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.window_size, 10);
        assert!((config.failure_rate_threshold - 70.0).abs() < f32::EPSILON);
        assert_eq!(config.wait_duration_in_open, Duration::from_secs(10));
        assert_eq!(config.permitted_calls_in_half_open, 4);
        assert!(config.validate().is_ok());
    }

    /// Validates configuration rejection of out-of-range values.
    ///
    /// Assertions:
    /// - Zero window size is rejected.
    /// - Threshold outside (0, 100] is rejected.
    /// - Zero half-open permits are rejected.
    #[test]
    fn test_config_validation() {
        assert!(CircuitBreakerConfig::builder().window_size(0).build().is_err());
        assert!(CircuitBreakerConfig::builder().failure_rate_threshold(0.0).build().is_err());
        assert!(CircuitBreakerConfig::builder().failure_rate_threshold(101.0).build().is_err());
        assert!(CircuitBreakerConfig::builder().permitted_calls_in_half_open(0).build().is_err());

        let config = CircuitBreakerConfig::builder()
            .window_size(5)
            .failure_rate_threshold(50.0)
            .wait_duration_in_open(Duration::from_secs(1))
            .permitted_calls_in_half_open(2)
            .build()
            .unwrap();
        assert_eq!(config.window_size, 5);
    }

    /// Validates that a fresh breaker admits calls and stays closed on
    /// successes.
    #[test]
    fn test_closed_admits_and_stays_closed_on_success() {
        let (breaker, _clock) = breaker_with_mock_clock();
        for _ in 0..20 {
            assert!(breaker.try_acquire());
            breaker.record_success();
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    /// Drive a closed breaker to open with the minimum failure burst
    /// (7 failures reach exactly 70% of a size-10 window).
    fn trip(breaker: &CircuitBreaker<MockClock>) {
        for _ in 0..7 {
            assert!(breaker.try_acquire());
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    /// Validates the trip condition: window 10, threshold 70%, failures
    /// mixed with successes.
    ///
    /// Assertions:
    /// - With 6 failures recorded the breaker is still closed (60% of the
    ///   window capacity).
    /// - The failure that pushes the rate to the threshold opens it.
    /// - Subsequent acquisitions are rejected without recording outcomes.
    #[test]
    fn test_opens_at_failure_rate_threshold() {
        let (breaker, _clock) = breaker_with_mock_clock();

        for _ in 0..2 {
            assert!(breaker.try_acquire());
            breaker.record_success();
        }
        for i in 0..7 {
            assert!(breaker.try_acquire(), "call {} should be admitted", i + 3);
            breaker.record_failure();
            if i < 6 {
                assert_eq!(breaker.state(), CircuitState::Closed);
            }
        }

        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.try_acquire());
        assert!(!breaker.try_acquire());

        let metrics = breaker.metrics();
        assert_eq!(metrics.rejected_calls, 2);
        assert_eq!(metrics.failures_in_window, 7);
    }

    /// Validates that the rate is evaluated against the window capacity, so
    /// a failure burst opens the breaker before the window first fills.
    #[test]
    fn test_opens_before_window_is_full() {
        let (breaker, _clock) = breaker_with_mock_clock();
        trip(&breaker);
        assert_eq!(breaker.metrics().calls_in_window, 7);
    }

    /// Validates window eviction: old successes slide out and stop diluting
    /// the failure rate.
    #[test]
    fn test_window_slides_out_old_outcomes() {
        let config = CircuitBreakerConfig {
            window_size: 4,
            failure_rate_threshold: 50.0,
            ..test_config()
        };
        let breaker = CircuitBreaker::with_clock(config, MockClock::new()).unwrap();

        for _ in 0..4 {
            assert!(breaker.try_acquire());
            breaker.record_success();
        }
        // Window [S,S,S,S]; two failures evict two successes: [S,S,F,F] = 50%
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    /// Validates the lazy open-to-half-open transition at the wait
    /// boundary.
    ///
    /// Assertions:
    /// - Rejected at +9s, admitted at +11s.
    /// - The admitting acquisition leaves the breaker half-open.
    #[test]
    fn test_open_transitions_to_half_open_after_wait() {
        let (breaker, clock) = breaker_with_mock_clock();
        trip(&breaker);

        clock.advance_secs(9);
        assert!(!breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::Open);

        clock.advance_secs(2);
        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    /// Validates half-open probe accounting.
    ///
    /// Assertions:
    /// - Exactly `permitted_calls_in_half_open` probes are admitted.
    /// - The permit past the budget is rejected.
    /// - Enough successful probes close the breaker and clear the window.
    #[test]
    fn test_half_open_probe_budget_and_close() {
        let (breaker, clock) = breaker_with_mock_clock();
        trip(&breaker);
        clock.advance_secs(10);

        // 4 permits total, the transition itself consumed the first
        assert!(breaker.try_acquire());
        assert!(breaker.try_acquire());
        assert!(breaker.try_acquire());
        assert!(breaker.try_acquire());
        assert!(!breaker.try_acquire(), "5th probe should exceed the budget");

        breaker.record_success();
        breaker.record_success();
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().failures_in_window, 0);
        assert_eq!(breaker.metrics().calls_in_window, 0);
    }

    /// Validates that one failed probe reopens the breaker and voids the
    /// remaining permits until the wait elapses again.
    #[test]
    fn test_half_open_failure_reopens() {
        let (breaker, clock) = breaker_with_mock_clock();
        trip(&breaker);
        clock.advance_secs(10);

        assert!(breaker.try_acquire());
        breaker.record_success();
        assert!(breaker.try_acquire());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.try_acquire());

        // Wait restarts from the reopen instant
        clock.advance_secs(10);
        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    /// Validates that an outcome arriving after a reopen is ignored.
    #[test]
    fn test_late_outcome_while_open_is_ignored() {
        let (breaker, _clock) = breaker_with_mock_clock();
        trip(&breaker);

        breaker.record_success();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.metrics().failures_in_window, 7);
    }

    /// Validates `reset` restores a usable closed breaker.
    #[test]
    fn test_reset() {
        let (breaker, _clock) = breaker_with_mock_clock();
        trip(&breaker);

        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire());
        assert_eq!(breaker.metrics().failures_in_window, 0);
    }

    /// Validates that clones share state and concurrent recording keeps the
    /// window bounded.
    #[test]
    fn test_concurrent_access() {
        let breaker = CircuitBreaker::new(CircuitBreakerConfig {
            window_size: 16,
            failure_rate_threshold: 100.0,
            ..CircuitBreakerConfig::default()
        })
        .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let breaker = breaker.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        assert!(breaker.try_acquire());
                        breaker.record_success();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let metrics = breaker.metrics();
        assert_eq!(metrics.state, CircuitState::Closed);
        assert_eq!(metrics.calls_in_window, 16);
        assert_eq!(metrics.permitted_calls, 800);
    }
}
