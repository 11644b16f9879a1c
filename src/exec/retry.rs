// src/exec/retry.rs

//! Retry controller: re-run a failed command with exponential backoff.
//!
//! Only attempts that actually ran and failed are retried. A command that
//! could not be started is reported straight away, since running it again
//! will not make the executable appear.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::exec::backend::{CommandRunner, ExecutionOutcome, JobCommand};
use crate::types::ExitClass;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_FACTOR: u32 = 3;

/// How many times to retry and how to space the retries out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 means a single attempt.
    pub retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after every retry.
    pub factor: u32,
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    pub fn budget(&self) -> RetryBudget {
        RetryBudget {
            remaining: self.retries,
            delay: self.base_delay,
            factor: self.factor,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            base_delay: DEFAULT_BASE_DELAY,
            factor: DEFAULT_FACTOR,
        }
    }
}

/// Decision returned by the budget after an attempt finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Nothing to retry: the attempt succeeded or never started.
    Done,
    /// Sleep for `delay`, then run again. `remaining` is the budget left
    /// after this retry.
    Retry { delay: Duration, remaining: u32 },
    /// The attempt failed and no retries are left.
    Exhausted,
}

/// Remaining attempts and the current backoff delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBudget {
    remaining: u32,
    delay: Duration,
    factor: u32,
}

impl RetryBudget {
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Evaluate an attempt's outcome and, if a retry is due, spend one unit
    /// of budget and grow the delay.
    pub fn evaluate(&mut self, class: ExitClass) -> RetryDecision {
        if !class.is_retryable() {
            return RetryDecision::Done;
        }
        if self.remaining == 0 {
            return RetryDecision::Exhausted;
        }

        let delay = self.delay;
        self.remaining -= 1;
        self.delay = self.delay.saturating_mul(self.factor);
        RetryDecision::Retry {
            delay,
            remaining: self.remaining,
        }
    }
}

/// The last attempt's outcome plus how many attempts were made.
#[derive(Debug)]
pub struct RetryResult {
    pub outcome: ExecutionOutcome,
    pub attempts: u32,
}

/// Run `command` through `runner`, retrying failures per `policy`.
///
/// Attempts are strictly sequential. Each retry captures output from
/// scratch; only the final attempt's outcome is returned. If `cancel` fires
/// during a backoff sleep, no further attempt is made.
pub async fn run_with_retries(
    runner: &dyn CommandRunner,
    command: &JobCommand,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> RetryResult {
    let mut budget = policy.budget();
    let mut outcome = runner.run(command, cancel).await;
    let mut attempts = 1;

    loop {
        match budget.evaluate(outcome.class) {
            RetryDecision::Done => break,
            RetryDecision::Exhausted => {
                if policy.retries > 0 {
                    warn!(
                        attempts,
                        exit_code = outcome.class.code(),
                        "command still failing; retries exhausted"
                    );
                }
                break;
            }
            RetryDecision::Retry { delay, remaining } => {
                info!(
                    exit_code = outcome.class.code(),
                    ?delay,
                    "command returned {}; waiting {:?} for retry",
                    outcome.class.code(),
                    delay
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!(attempts, "cancelled during backoff; not retrying");
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }

                info!(remaining, "retrying command; {} retries remaining", remaining);
                outcome = runner.run(command, cancel).await;
                attempts += 1;
            }
        }
    }

    RetryResult { outcome, attempts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_never_retries() {
        let mut budget = RetryPolicy::new(0).budget();
        assert_eq!(budget.evaluate(ExitClass::Failed(1)), RetryDecision::Exhausted);
        assert_eq!(budget.evaluate(ExitClass::Success), RetryDecision::Done);
    }

    #[test]
    fn delay_grows_by_factor() {
        let mut budget = RetryPolicy::new(3).budget();
        let delays: Vec<_> = (0..4)
            .map(|_| budget.evaluate(ExitClass::Failed(1)))
            .collect();

        assert_eq!(
            delays,
            vec![
                RetryDecision::Retry { delay: Duration::from_secs(1), remaining: 2 },
                RetryDecision::Retry { delay: Duration::from_secs(3), remaining: 1 },
                RetryDecision::Retry { delay: Duration::from_secs(9), remaining: 0 },
                RetryDecision::Exhausted,
            ]
        );
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn start_failures_are_not_retried() {
        let mut budget = RetryPolicy::new(5).budget();
        assert_eq!(budget.evaluate(ExitClass::NotStarted), RetryDecision::Done);
        assert_eq!(budget.remaining(), 5);
    }

    #[test]
    fn success_does_not_spend_budget() {
        let mut budget = RetryPolicy::new(2).budget();
        assert_eq!(budget.evaluate(ExitClass::Success), RetryDecision::Done);
        assert_eq!(budget.remaining(), 2);
        assert_eq!(budget.delay(), DEFAULT_BASE_DELAY);
    }

    #[test]
    fn huge_delay_saturates() {
        let policy = RetryPolicy {
            retries: 2,
            base_delay: Duration::MAX,
            factor: 3,
        };
        let mut budget = policy.budget();
        budget.evaluate(ExitClass::Signaled(9));
        assert_eq!(budget.delay(), Duration::MAX);
    }
}
