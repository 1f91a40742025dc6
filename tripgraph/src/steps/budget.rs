//! Budget management, with optional human confirmation of the proposed tier.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::StepFailure;
use crate::graph::{Step, StepId, StepOutcome};
use crate::state::{PlanningState, SlotId, StatePatch};
use crate::worker::{Criteria, WorkerKind, WorkerRegistry};

use super::{degraded, perform, present};

/// Prompt of the interrupt raised when a proposed budget tier needs confirmation.
pub const CONFIRM_TIER_PROMPT: &str = "confirm_tier";

/// Computes the budget plan from whatever earlier results are present.
///
/// With confirmation on and a worker result carrying a `"tier"`, the first attempt
/// suspends the run. The answer is read back on resume: `{"approved": true}` accepts the
/// plan, an optional `"tier"` in the answer replaces the proposed one, and anything else
/// is a permanent failure. An answer already in the state is checked whatever the
/// confirmation setting, so a session resumed under a different configuration still
/// respects it.
pub struct ManageBudgetStep {
    registry: Arc<WorkerRegistry>,
    confirm_tier: bool,
}

impl ManageBudgetStep {
    pub fn new(registry: Arc<WorkerRegistry>, confirm_tier: bool) -> Self {
        Self {
            registry,
            confirm_tier,
        }
    }
}

#[async_trait]
impl Step for ManageBudgetStep {
    fn id(&self) -> StepId {
        StepId::ManageBudget
    }

    async fn execute(&self, state: &PlanningState) -> Result<StepOutcome, StepFailure> {
        let earlier = [
            SlotId::Flights,
            SlotId::Accommodation,
            SlotId::Transportation,
            SlotId::Activities,
        ];
        let budget_range = state
            .query
            .budget
            .as_ref()
            .and_then(|b| serde_json::to_value(b).ok());
        let criteria = Criteria::new(self.id(), &state.query)
            .with("budget_range", budget_range)
            .with("flights", present(state, SlotId::Flights))
            .with("accommodation", present(state, SlotId::Accommodation))
            .with("transportation", present(state, SlotId::Transportation))
            .with("activities", present(state, SlotId::Activities))
            .with("degraded", degraded(state, &earlier));
        let mut plan = perform(&self.registry, WorkerKind::BudgetManagement, &criteria).await?;

        let tier = plan.get("tier").cloned();
        let Some(answer) = state.input_for(self.id()) else {
            return Ok(match tier {
                Some(tier) if self.confirm_tier => {
                    StepOutcome::interrupt(CONFIRM_TIER_PROMPT, json!({ "tier": tier }))
                }
                _ => StepOutcome::complete(StatePatch::new().set(SlotId::Budget, plan)),
            });
        };
        // A stored answer is honoured even if this graph was built without confirmation.
        if answer.get("approved").and_then(Value::as_bool) != Some(true) {
            return Err(StepFailure::permanent(format!(
                "budget tier {} was not approved",
                tier.unwrap_or(Value::Null)
            )));
        }
        if let (Some(chosen), Value::Object(map)) = (answer.get("tier"), &mut plan) {
            map.insert("tier".to_string(), chosen.clone());
        }
        Ok(StepOutcome::complete(StatePatch::new().set(SlotId::Budget, plan)))
    }
}
