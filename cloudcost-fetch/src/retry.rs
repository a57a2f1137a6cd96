//! Bounded retry for delivery targets.
//!
//! Retries are immediate. The decision of what to do after an attempt is a
//! pure function of the attempt number and outcome, so it is tested without
//! running anything.

use std::fmt::Display;
use std::future::Future;

use tracing::{debug, warn};

/// Default number of attempts per delivery target.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// What to do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The attempt succeeded.
    Succeed,
    /// The attempt failed and another one is allowed.
    Retry,
    /// The attempt failed and no attempts are left.
    Fail,
}

/// Error returned once all attempts failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Number of attempts made.
    pub attempts: u32,
    /// Error of the final attempt.
    pub last_error: E,
}

/// Retry policy with a fixed attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy. At least one attempt is always made.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides what follows attempt number `attempt` (1-based).
    pub fn decide<T, E>(&self, attempt: u32, outcome: &Result<T, E>) -> RetryDecision {
        match outcome {
            Ok(_) => RetryDecision::Succeed,
            Err(_) if attempt < self.max_attempts => RetryDecision::Retry,
            Err(_) => RetryDecision::Fail,
        }
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the final attempt's error once every attempt has failed.
    pub async fn run<T, E, F, Fut>(&self, target: &str, mut operation: F) -> Result<T, RetryExhausted<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            let outcome = operation().await;
            match self.decide(attempt, &outcome) {
                RetryDecision::Succeed => {
                    debug!(target_name = target, attempt, "Delivery succeeded");
                    return outcome.map_err(|last_error| RetryExhausted { attempts: attempt, last_error });
                }
                RetryDecision::Retry => {
                    if let Err(e) = &outcome {
                        warn!(target_name = target, attempt, error = %e, "Delivery attempt failed, retrying");
                    }
                    attempt += 1;
                }
                RetryDecision::Fail => {
                    return outcome.map_err(|last_error| {
                        warn!(target_name = target, attempts = attempt, error = %last_error, "Delivery failed");
                        RetryExhausted { attempts: attempt, last_error }
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
