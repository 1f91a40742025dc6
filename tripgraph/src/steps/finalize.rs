//! Final summary written by the orchestrator worker.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StepFailure;
use crate::graph::{Step, StepId, StepOutcome};
use crate::state::{PlanningState, SlotId, StatePatch};
use crate::worker::{Criteria, WorkerKind, WorkerRegistry};

use super::{degraded, perform, present};

pub struct FinalizePlanStep {
    registry: Arc<WorkerRegistry>,
}

impl FinalizePlanStep {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Step for FinalizePlanStep {
    fn id(&self) -> StepId {
        StepId::FinalizePlan
    }

    async fn execute(&self, state: &PlanningState) -> Result<StepOutcome, StepFailure> {
        let sections = [
            SlotId::Destination,
            SlotId::Flights,
            SlotId::Accommodation,
            SlotId::Transportation,
            SlotId::Activities,
            SlotId::Budget,
        ];
        let mut criteria = Criteria::new(self.id(), &state.query)
            .with("destination", state.effective_destination())
            .with("degraded", degraded(state, &sections));
        for slot in sections {
            criteria = criteria.with(slot.as_str(), present(state, slot));
        }
        let summary = perform(&self.registry, WorkerKind::Orchestrator, &criteria).await?;
        Ok(StepOutcome::complete(
            StatePatch::new().set(SlotId::Summary, summary),
        ))
    }
}
