//! Per-step retry policy.
//!
//! Transient failures are retried up to the attempt budget with exponential backoff;
//! permanent failures stop immediately. Every failed attempt is reported so the executor
//! can append it to the error log.

use crate::config::Backoff;
use crate::error::StepFailure;
use crate::graph::logging;
use crate::graph::step::{Step, StepOutcome};
use crate::state::{ErrorEntry, PlanningState};

/// Outcome of running one step under the retry policy.
#[derive(Debug)]
pub(crate) struct RetryReport {
    /// Number of attempts made, never more than the budget.
    pub attempts: u32,
    /// One entry per failed attempt, in attempt order.
    pub failures: Vec<ErrorEntry>,
    /// Outcome of the last attempt; `Err` when the budget ran out or the failure was permanent.
    pub result: Result<StepOutcome, StepFailure>,
}

pub(crate) async fn run_with_retry(
    step: &dyn Step,
    state: &PlanningState,
    max_attempts: u32,
    backoff: Backoff,
) -> RetryReport {
    run_with_retry_reporting(step, state, max_attempts, backoff, |_| {}).await
}

/// Like [`run_with_retry`], and hands each failed attempt to `on_failure` as soon as it
/// is recorded, so a caller that may cancel the run still sees the attempts made so far.
pub(crate) async fn run_with_retry_reporting<F>(
    step: &dyn Step,
    state: &PlanningState,
    max_attempts: u32,
    backoff: Backoff,
    mut on_failure: F,
) -> RetryReport
where
    F: FnMut(&ErrorEntry) + Send,
{
    let id = step.id();
    let mut failures = Vec::new();
    let mut attempt = 0;
    loop {
        attempt += 1;
        let failure = match step.execute(state).await {
            Ok(outcome) => {
                return RetryReport {
                    attempts: attempt,
                    failures,
                    result: Ok(outcome),
                }
            }
            Err(failure) => failure,
        };
        let entry = ErrorEntry {
            step: id,
            attempt,
            kind: failure.kind.into(),
            message: failure.message.clone(),
        };
        on_failure(&entry);
        failures.push(entry);
        if !failure.is_transient() || attempt >= max_attempts {
            return RetryReport {
                attempts: attempt,
                failures,
                result: Err(failure),
            };
        }
        let delay = backoff.delay(attempt);
        logging::log_retry(
            &state.session_id,
            id,
            attempt,
            max_attempts,
            delay,
            &failure.message,
        );
        tokio::time::sleep(delay).await;
    }
}
