//! What `start` and `resume` hand back to the caller.

use std::collections::BTreeSet;

use crate::graph::Branch;
use crate::plan::FinalPlan;
use crate::state::{InterruptMarker, PlanningState, Stage};

/// Position of the executor's state machine.
///
/// Rebuilt from a checkpoint on resume via [`ExecutorState::from_state`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutorState {
    Ready,
    Running(Stage),
    AwaitingJoin(BTreeSet<Branch>),
    Suspended(InterruptMarker),
    Terminal(Stage),
}

impl ExecutorState {
    /// Where a run described by `state` stands.
    pub fn from_state(state: &PlanningState) -> Self {
        if let Some(marker) = &state.interrupt {
            return ExecutorState::Suspended(marker.clone());
        }
        match state.stage {
            Stage::Complete | Stage::Error => ExecutorState::Terminal(state.stage),
            Stage::ParallelSearch if !state.pending_branches.is_empty() => {
                ExecutorState::AwaitingJoin(state.pending_branches.clone())
            }
            Stage::Analyzing if state.completed_steps.is_empty() && state.error_log.is_empty() => {
                ExecutorState::Ready
            }
            stage => ExecutorState::Running(stage),
        }
    }
}

/// How a run call ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Reached COMPLETE; `plan` lists every section with its status.
    Completed {
        state: Box<PlanningState>,
        plan: FinalPlan,
    },
    /// Waiting for external input; call `resume` with the answer.
    Suspended {
        state: Box<PlanningState>,
        interrupt: InterruptMarker,
    },
}

/// Result of `start` / `resume`.
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub session_id: String,
    pub outcome: RunOutcome,
}

impl RunHandle {
    pub fn state(&self) -> &PlanningState {
        match &self.outcome {
            RunOutcome::Completed { state, .. } | RunOutcome::Suspended { state, .. } => state,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { .. })
    }

    pub fn interrupt(&self) -> Option<&InterruptMarker> {
        match &self.outcome {
            RunOutcome::Suspended { interrupt, .. } => Some(interrupt),
            RunOutcome::Completed { .. } => None,
        }
    }

    pub fn plan(&self) -> Option<&FinalPlan> {
        match &self.outcome {
            RunOutcome::Completed { plan, .. } => Some(plan),
            RunOutcome::Suspended { .. } => None,
        }
    }
}
