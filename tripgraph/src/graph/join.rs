//! Parallel fan-out and the bounded join barrier.
//!
//! Each pending branch runs on its own task under the retry policy, reading the same
//! frozen snapshot. A semaphore caps how many are in flight. When the join deadline
//! passes, unresolved tasks are aborted and awaited so their collaborator calls are
//! dropped before the join returns. Failed attempts are streamed back over a channel as
//! they happen, so a cancelled branch still reports the attempts it made. Nothing here
//! touches the shared state; the executor merges the returned reports in branch order.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::config::EngineConfig;
use crate::error::StepFailure;
use crate::graph::retry::{run_with_retry_reporting, RetryReport};
use crate::graph::step::{InterruptRequest, Step, StepOutcome};
use crate::graph::{logging, Branch, StepId};
use crate::state::{ErrorEntry, PlanningState, StatePatch};

/// How a branch resolved.
#[derive(Debug)]
pub(crate) enum BranchResolution {
    Completed(StatePatch),
    Interrupted(InterruptRequest),
    Failed(StepFailure),
    /// Still running at the join deadline; the task was cancelled.
    TimedOut,
}

#[derive(Debug)]
pub(crate) struct BranchReport {
    pub failures: Vec<ErrorEntry>,
    pub resolution: BranchResolution,
}

impl From<RetryReport> for BranchReport {
    fn from(report: RetryReport) -> Self {
        let resolution = match report.result {
            Ok(StepOutcome::Complete { patch }) => BranchResolution::Completed(patch),
            Ok(StepOutcome::Interrupt(request)) => BranchResolution::Interrupted(request),
            Err(failure) => BranchResolution::Failed(failure),
        };
        Self {
            failures: report.failures,
            resolution,
        }
    }
}

/// Runs `branches` concurrently and waits for all of them or the join timeout.
///
/// Every requested branch gets exactly one report.
pub(crate) async fn run_branches(
    branches: Vec<(Branch, Arc<dyn Step>)>,
    snapshot: Arc<PlanningState>,
    config: &EngineConfig,
) -> BTreeMap<Branch, BranchReport> {
    let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
    let (failure_tx, mut failure_rx) = mpsc::unbounded_channel::<ErrorEntry>();
    let mut set = JoinSet::new();
    let requested: Vec<Branch> = branches.iter().map(|(b, _)| *b).collect();
    logging::log_join_start(&snapshot.session_id, &requested);

    for (branch, step) in branches {
        let semaphore = semaphore.clone();
        let snapshot = snapshot.clone();
        let attempts = config.attempts_for(step.id().class());
        let backoff = config.backoff;
        let failure_tx = failure_tx.clone();
        set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let report =
                run_with_retry_reporting(step.as_ref(), &snapshot, attempts, backoff, |entry| {
                    let _ = failure_tx.send(entry.clone());
                })
                .await;
            (branch, BranchReport::from(report))
        });
    }
    drop(failure_tx);

    let deadline = tokio::time::Instant::now() + config.join_timeout;
    let mut reports = BTreeMap::new();
    let mut timed_out = false;
    loop {
        match tokio::time::timeout_at(deadline, set.join_next()).await {
            Ok(Some(Ok((branch, report)))) => {
                reports.insert(branch, report);
            }
            // A panicked branch shows up below as missing from `reports`.
            Ok(Some(Err(_))) => {}
            Ok(None) => break,
            Err(_) => {
                timed_out = true;
                set.shutdown().await;
                break;
            }
        }
    }

    let missing: Vec<Branch> = requested
        .into_iter()
        .filter(|b| !reports.contains_key(b))
        .collect();
    if timed_out && !missing.is_empty() {
        logging::log_join_timeout(&snapshot.session_id, &missing, config.join_timeout);
    }
    // Every task has finished or been aborted, so the channel holds all attempts made.
    let mut streamed: BTreeMap<StepId, Vec<ErrorEntry>> = BTreeMap::new();
    while let Ok(entry) = failure_rx.try_recv() {
        streamed.entry(entry.step).or_default().push(entry);
    }
    for branch in missing {
        let resolution = if timed_out {
            BranchResolution::TimedOut
        } else {
            BranchResolution::Failed(StepFailure::permanent(format!(
                "{} branch task aborted",
                branch
            )))
        };
        reports.insert(
            branch,
            BranchReport {
                failures: streamed.remove(&branch.step()).unwrap_or_default(),
                resolution,
            },
        );
    }
    reports
}
