// crates/repsheet-core/src/runtime/retry.rs
// ============================================================================
// Module: Repsheet Retry Executor
// Description: Bounded retry with linear backoff for remote store calls.
// Purpose: Absorb transient backend failures without amplifying load.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! The retry executor wraps remote operations in a bounded attempt loop with
//! linear backoff: the sleep after attempt `n` is `base_delay * n`, so
//! repeated failures space out instead of storming a rate-limited backend.
//! Attempt state is an explicit [`RetryAttempt`] value threaded into each
//! invocation, never a shared mutable counter.
//!
//! ## Invariants
//! - Only retryable failures ([`StoreError::is_retryable`]) are absorbed;
//!   every other kind propagates immediately.
//! - Exhaustion yields `Ok(None)`, the "could not determine" sentinel,
//!   never a panic and never an error.
//! - The `on_error` observer sees every failed attempt exactly once,
//!   including the final one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

/// Bounded-retry policy with linear backoff.
///
/// # Invariants
/// - `max_attempts` below 1 is treated as 1 by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base backoff unit; the sleep after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy from explicit bounds.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Returns the backoff to sleep after a failed attempt.
    ///
    /// Linear backoff: `base_delay * attempt`, saturating on overflow.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.checked_mul(attempt).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

// ============================================================================
// SECTION: Sleep Seam
// ============================================================================

/// Sleep seam so tests can run the executor without real delays.
pub trait Sleeper: Send + Sync {
    /// Blocks the current thread for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the OS scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeper that returns immediately; intended for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration) {}
}

// ============================================================================
// SECTION: Attempt State
// ============================================================================

/// Explicit attempt state handed to the wrapped operation.
///
/// # Invariants
/// - `number` starts at 1 and increases by 1 per attempt.
/// - `retrying` is advisory only (true once `number > 1`) and has no effect
///   on control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 1-based attempt number.
    pub number: u32,
    /// True for every attempt after the first; advisory UI signal.
    pub retrying: bool,
}

// ============================================================================
// SECTION: Retry Executor
// ============================================================================

/// Executes operations under a bounded linear-backoff retry policy.
pub struct RetryExecutor {
    /// Attempt and backoff bounds.
    policy: RetryPolicy,
    /// Sleep seam used between attempts.
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    /// Creates an executor that sleeps on the current thread.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(ThreadSleeper))
    }

    /// Creates an executor with a custom sleep seam.
    #[must_use]
    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Returns the policy the executor runs under.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Runs the operation under the retry policy.
    ///
    /// Returns `Ok(Some(value))` on the first success and `Ok(None)` when
    /// every attempt failed with a retryable error.
    ///
    /// # Errors
    ///
    /// Returns the operation's error unchanged when it is not retryable.
    pub fn run<T>(
        &self,
        operation: impl FnMut(RetryAttempt) -> Result<T, StoreError>,
    ) -> Result<Option<T>, StoreError> {
        self.run_observed(operation, |_, _| {})
    }

    /// Runs the operation under the retry policy, reporting each failed
    /// attempt to the observer with its 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the operation's error unchanged when it is not retryable.
    pub fn run_observed<T>(
        &self,
        mut operation: impl FnMut(RetryAttempt) -> Result<T, StoreError>,
        mut on_error: impl FnMut(&StoreError, u32),
    ) -> Result<Option<T>, StoreError> {
        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let state = RetryAttempt {
                number: attempt,
                retrying: attempt > 1,
            };
            match operation(state) {
                Ok(value) => return Ok(Some(value)),
                Err(error) if !error.is_retryable() => return Err(error),
                Err(error) => {
                    on_error(&error, attempt);
                    if attempt < max_attempts {
                        self.sleeper.sleep(self.policy.delay_for_attempt(attempt));
                    }
                }
            }
        }
        Ok(None)
    }
}
