// crates/repsheet-core/tests/retry_unit.rs
// ============================================================================
// Module: Retry Executor Unit Tests
// Description: Attempt accounting, backoff scaling, and error classification.
// Purpose: Pin the bounded-retry contract the store callers rely on.
// ============================================================================

//! ## Overview
//! Exercises the retry executor against a fake sleeper: success short-circuits,
//! transient failures back off linearly and report every attempt, exhaustion
//! yields the no-result sentinel, and non-retryable errors propagate on the
//! first attempt.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use repsheet_core::RetryExecutor;
use repsheet_core::RetryPolicy;
use repsheet_core::StoreError;
use repsheet_core::TableId;
use repsheet_core::runtime::retry::NoopSleeper;
use repsheet_core::runtime::retry::Sleeper;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Sleeper that records requested delays instead of sleeping.
#[derive(Default)]
struct RecordingSleeper {
    /// Delays requested by the executor, in order.
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Returns the recorded delays in request order.
    fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Executor with a no-op sleeper for tests that ignore timing.
fn fast_executor(policy: RetryPolicy) -> RetryExecutor {
    RetryExecutor::with_sleeper(policy, Arc::new(NoopSleeper))
}

/// A transient failure as the backing store would surface it.
fn transient() -> StoreError {
    StoreError::RemoteUnavailable {
        reason: "connection reset".to_string(),
    }
}

// ============================================================================
// SECTION: Success Paths
// ============================================================================

/// A first-attempt success returns the value and never touches the sleeper.
#[test]
fn first_attempt_success_skips_backoff() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let executor = RetryExecutor::with_sleeper(RetryPolicy::default(), sleeper.clone());

    let result = executor.run(|_| Ok::<_, StoreError>(7_u32));

    assert_eq!(result, Ok(Some(7)));
    assert!(sleeper.recorded().is_empty());
}

/// Two transient failures followed by a success recover the value, and the
/// observer sees each failure with its 1-based attempt number.
#[test]
fn transient_failures_then_success_reports_each_attempt() {
    let executor = fast_executor(RetryPolicy::default());
    let mut observed_attempts = Vec::new();
    let mut seen = Vec::new();

    let result = executor.run_observed(
        |attempt| {
            seen.push((attempt.number, attempt.retrying));
            if attempt.number < 3 {
                Err(transient())
            } else {
                Ok("done")
            }
        },
        |error, attempt| {
            assert!(error.is_retryable());
            observed_attempts.push(attempt);
        },
    );

    assert_eq!(result, Ok(Some("done")));
    assert_eq!(observed_attempts, vec![1, 2]);
    assert_eq!(seen, vec![(1, false), (2, true), (3, true)]);
}

// ============================================================================
// SECTION: Exhaustion
// ============================================================================

/// Exhausting every attempt yields the no-result sentinel rather than an
/// error, and the observer sees the final failure too.
#[test]
fn exhaustion_returns_no_result_sentinel() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let policy = RetryPolicy::new(3, Duration::from_millis(100));
    let executor = RetryExecutor::with_sleeper(policy, sleeper.clone());
    let mut failures = 0;

    let result =
        executor.run_observed(|_| Err::<(), _>(transient()), |_, _| failures += 1);

    assert_eq!(result, Ok(None));
    assert_eq!(failures, 3);
    // No sleep after the final attempt.
    assert_eq!(
        sleeper.recorded(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
}

/// A zero-attempt policy is clamped to one real attempt.
#[test]
fn zero_max_attempts_clamps_to_one() {
    let executor = fast_executor(RetryPolicy::new(0, Duration::ZERO));
    let mut invocations = 0;

    let result = executor.run(|_| {
        invocations += 1;
        Err::<(), _>(transient())
    });

    assert_eq!(result, Ok(None));
    assert_eq!(invocations, 1);
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

/// Non-retryable errors propagate unchanged on the first attempt, without
/// invoking the observer.
#[test]
fn non_retryable_error_propagates_immediately() {
    let executor = fast_executor(RetryPolicy::default());
    let mut invocations = 0;
    let mut failures = 0;

    let result = executor.run_observed(
        |_| {
            invocations += 1;
            Err::<(), _>(StoreError::NotFound {
                table: TableId::new("profiles"),
            })
        },
        |_, _| failures += 1,
    );

    assert_eq!(
        result,
        Err(StoreError::NotFound {
            table: TableId::new("profiles"),
        })
    );
    assert_eq!(invocations, 1);
    assert_eq!(failures, 0);
}

/// Readiness failures are not transient and must not be retried.
#[test]
fn not_ready_is_not_retried() {
    let executor = fast_executor(RetryPolicy::default());
    let mut invocations = 0;

    let result = executor.run(|_| {
        invocations += 1;
        Err::<(), _>(StoreError::NotReady)
    });

    assert_eq!(result, Err(StoreError::NotReady));
    assert_eq!(invocations, 1);
}

// ============================================================================
// SECTION: Backoff Shape
// ============================================================================

/// Delays scale linearly with the attempt number.
#[test]
fn linear_backoff_scales_with_attempt_number() {
    let sleeper = Arc::new(RecordingSleeper::default());
    let policy = RetryPolicy::new(4, Duration::from_millis(250));
    let executor = RetryExecutor::with_sleeper(policy, sleeper.clone());

    let result = executor.run(|_| Err::<(), _>(transient()));

    assert_eq!(result, Ok(None));
    assert_eq!(
        sleeper.recorded(),
        vec![
            Duration::from_millis(250),
            Duration::from_millis(500),
            Duration::from_millis(750),
        ]
    );
}

/// The per-attempt delay saturates instead of overflowing.
#[test]
fn policy_delay_saturates_on_overflow() {
    let policy = RetryPolicy::new(3, Duration::MAX);
    assert_eq!(policy.delay_for_attempt(2), Duration::MAX);
}
