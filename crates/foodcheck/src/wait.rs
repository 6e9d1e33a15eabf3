//! Wait Engine
//!
//! Blocking, polling condition evaluator. Converts the page's asynchronous
//! re-render after an action into a synchronous checkpoint.
//!
//! A condition is evaluated immediately and then once per poll interval until
//! it holds or the wall-clock timeout elapses. The number of evaluations is
//! never fixed; only elapsed time bounds the loop, and the final sleep is
//! clipped to the remaining budget so the caller is never blocked longer than
//! the timeout plus one evaluation.

use crate::result::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// WAIT CONDITION TRAIT
// =============================================================================

/// Outcome of one condition evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation<T> {
    /// The condition holds; carries the observed value
    Satisfied(T),
    /// The condition does not hold yet
    Unsatisfied {
        /// Rendering of what was observed, kept for the timeout report
        observed: String,
    },
}

impl<T> Evaluation<T> {
    /// Build an unsatisfied evaluation
    pub fn unsatisfied(observed: impl Into<String>) -> Self {
        Self::Unsatisfied {
            observed: observed.into(),
        }
    }

    /// Whether the condition held
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }
}

/// A predicate over observable state.
///
/// Implementations must be side-effect free: the engine evaluates them as
/// many times as the timeout allows. An `Err` from `evaluate` is a hard
/// failure and is not retried.
pub trait WaitCondition {
    /// Value produced once the condition holds
    type Output;

    /// Observe the current state
    fn evaluate(&mut self) -> HarnessResult<Evaluation<Self::Output>>;

    /// Get description for error messages
    fn description(&self) -> String;
}

/// A function-based wait condition
pub struct FnCondition<F> {
    func: F,
    description: String,
}

impl<F> std::fmt::Debug for FnCondition<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCondition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> FnCondition<F> {
    /// Create a new function condition
    pub fn new(func: F, description: impl Into<String>) -> Self {
        Self {
            func,
            description: description.into(),
        }
    }
}

impl<T, F> WaitCondition for FnCondition<F>
where
    F: FnMut() -> HarnessResult<Evaluation<T>>,
{
    type Output = T;

    fn evaluate(&mut self) -> HarnessResult<Evaluation<T>> {
        (self.func)()
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult<T> {
    /// Value carried by the satisfied evaluation
    pub value: T,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of evaluations performed
    pub evaluations: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAITER IMPLEMENTATION
// =============================================================================

/// Waiter for synchronization operations
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options used by [`Waiter::wait`]
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Wait for a condition using this waiter's options
    pub fn wait<C: WaitCondition>(&self, condition: C) -> HarnessResult<WaitResult<C::Output>> {
        self.await_condition(condition, &self.options)
    }

    /// Evaluate `condition` until it holds or `options.timeout_ms` elapses.
    ///
    /// # Errors
    ///
    /// [`HarnessError::TimedOut`] with the last observed value, or the first
    /// error returned by the condition itself.
    pub fn await_condition<C: WaitCondition>(
        &self,
        mut condition: C,
        options: &WaitOptions,
    ) -> HarnessResult<WaitResult<C::Output>> {
        let start = Instant::now();
        let timeout = options.timeout();
        let poll_interval = options.poll_interval();
        let mut evaluations = 0_u32;

        loop {
            evaluations += 1;
            let last_observed = match condition.evaluate()? {
                Evaluation::Satisfied(value) => {
                    let elapsed = start.elapsed();
                    debug!(
                        condition = %condition.description(),
                        evaluations,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "wait satisfied"
                    );
                    return Ok(WaitResult {
                        value,
                        elapsed,
                        evaluations,
                        waited_for: condition.description(),
                    });
                }
                Evaluation::Unsatisfied { observed } => observed,
            };

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                let description = condition.description();
                warn!(
                    condition = %description,
                    evaluations,
                    timeout_ms = options.timeout_ms,
                    last_observed = %last_observed,
                    "wait timed out"
                );
                return Err(HarnessError::TimedOut {
                    condition: description,
                    timeout_ms: options.timeout_ms,
                    last_observed,
                });
            }
            std::thread::sleep(poll_interval.min(timeout - elapsed));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(200).with_poll_interval(5)
    }

    // =========================================================================
    // WaitOptions Tests
    // =========================================================================

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_wait_options_builders() {
            let opts = WaitOptions::new().with_timeout(5000).with_poll_interval(25);
            assert_eq!(opts.timeout(), Duration::from_millis(5000));
            assert_eq!(opts.poll_interval(), Duration::from_millis(25));
        }

        #[test]
        fn test_wait_options_deserialize_partial() {
            let opts: WaitOptions = serde_json::from_str(r#"{"timeout_ms": 750}"#).unwrap();
            assert_eq!(opts.timeout_ms, 750);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }
    }

    // =========================================================================
    // Waiter Tests
    // =========================================================================

    mod waiter_tests {
        use super::*;

        #[test]
        fn test_immediate_success_evaluates_once() {
            let calls = Cell::new(0);
            let cond = FnCondition::new(
                || {
                    calls.set(calls.get() + 1);
                    Ok(Evaluation::Satisfied(42))
                },
                "always",
            );
            let result = Waiter::new().await_condition(cond, &fast()).unwrap();
            assert_eq!(result.value, 42);
            assert_eq!(result.evaluations, 1);
            assert_eq!(calls.get(), 1);
            assert_eq!(result.waited_for, "always");
        }

        #[test]
        fn test_success_after_polls() {
            let calls = Cell::new(0);
            let cond = FnCondition::new(
                || {
                    calls.set(calls.get() + 1);
                    Ok(if calls.get() >= 3 {
                        Evaluation::Satisfied(calls.get())
                    } else {
                        Evaluation::unsatisfied(format!("{} calls", calls.get()))
                    })
                },
                "third call",
            );
            let result = Waiter::with_options(fast()).wait(cond).unwrap();
            assert_eq!(result.value, 3);
            assert_eq!(result.evaluations, 3);
        }

        #[test]
        fn test_timeout_carries_last_observed() {
            let calls = Cell::new(0);
            let cond = FnCondition::new(
                || {
                    calls.set(calls.get() + 1);
                    Ok(Evaluation::<()>::unsatisfied(format!("{} rows", calls.get())))
                },
                "row count == 5",
            );
            let err = Waiter::new()
                .await_condition(cond, &WaitOptions::new().with_timeout(30).with_poll_interval(5))
                .unwrap_err();
            match err {
                HarnessError::TimedOut {
                    condition,
                    timeout_ms,
                    last_observed,
                } => {
                    assert_eq!(condition, "row count == 5");
                    assert_eq!(timeout_ms, 30);
                    assert_eq!(last_observed, format!("{} rows", calls.get()));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_zero_timeout_still_evaluates_once() {
            let calls = Cell::new(0);
            let cond = FnCondition::new(
                || {
                    calls.set(calls.get() + 1);
                    Ok(Evaluation::<()>::unsatisfied("no"))
                },
                "never",
            );
            let err = Waiter::new()
                .await_condition(cond, &WaitOptions::new().with_timeout(0))
                .unwrap_err();
            assert!(err.is_timeout());
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_condition_error_is_not_retried() {
            let calls = Cell::new(0);
            let cond = FnCondition::new(
                || -> HarnessResult<Evaluation<()>> {
                    calls.set(calls.get() + 1);
                    Err(HarnessError::driver("session closed"))
                },
                "broken",
            );
            let err = Waiter::new().await_condition(cond, &fast()).unwrap_err();
            assert_eq!(err.kind(), "driver");
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_timeout_is_bounded() {
            let timeout_ms = 60;
            let poll_ms = 25;
            let cond = FnCondition::new(|| Ok(Evaluation::<()>::unsatisfied("never")), "never");
            let start = Instant::now();
            let _ = Waiter::new().await_condition(
                cond,
                &WaitOptions::new()
                    .with_timeout(timeout_ms)
                    .with_poll_interval(poll_ms),
            );
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(timeout_ms));
            // Generous slack for scheduler jitter on loaded CI hosts.
            assert!(elapsed < Duration::from_millis(timeout_ms + poll_ms + 100));
        }
    }
}
