//! Step trait: one phase of the planning pipeline.
//!
//! A step reads an immutable [`PlanningState`] snapshot and returns either a patch or an
//! interrupt request. It never retries on its own; each call is exactly one attempt.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StepFailure;
use crate::graph::StepId;
use crate::state::{PlanningState, StatePatch};

/// Request for external input raised by a step instead of a patch.
#[derive(Debug, Clone, PartialEq)]
pub struct InterruptRequest {
    pub prompt: String,
    pub payload: Value,
}

impl InterruptRequest {
    pub fn new(prompt: impl Into<String>, payload: Value) -> Self {
        Self {
            prompt: prompt.into(),
            payload,
        }
    }
}

/// Result of one successful step attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The step finished; `patch` is merged into the state.
    Complete { patch: StatePatch },
    /// The step cannot finish without external input; the run suspends.
    Interrupt(InterruptRequest),
}

impl StepOutcome {
    pub fn complete(patch: StatePatch) -> Self {
        StepOutcome::Complete { patch }
    }

    pub fn interrupt(prompt: impl Into<String>, payload: Value) -> Self {
        StepOutcome::Interrupt(InterruptRequest::new(prompt, payload))
    }
}

/// One node of the planning graph.
///
/// **Interaction**: Registered with `PlanningGraph::add_step`; invoked by the executor
/// under its retry policy. The next stage is decided by the routing table, not the step.
#[async_trait]
pub trait Step: Send + Sync {
    /// Graph id of this step; also decides which slot it may write.
    fn id(&self) -> StepId;

    /// Whether exhausting the attempt budget degrades the slot (true) or fails the run.
    fn degradable(&self) -> bool {
        true
    }

    /// Runs one attempt against `state`.
    async fn execute(&self, state: &PlanningState) -> Result<StepOutcome, StepFailure>;
}
