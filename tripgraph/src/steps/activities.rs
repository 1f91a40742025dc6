//! Activity planning, after the parallel phase has joined.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StepFailure;
use crate::graph::{Step, StepId, StepOutcome};
use crate::state::{PlanningState, SlotId, StatePatch};
use crate::worker::{Criteria, WorkerKind, WorkerRegistry};

use super::{degraded, perform, present};

pub struct PlanActivitiesStep {
    registry: Arc<WorkerRegistry>,
}

impl PlanActivitiesStep {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Step for PlanActivitiesStep {
    fn id(&self) -> StepId {
        StepId::PlanActivities
    }

    async fn execute(&self, state: &PlanningState) -> Result<StepOutcome, StepFailure> {
        let searched = [SlotId::Flights, SlotId::Accommodation, SlotId::Transportation];
        let criteria = Criteria::new(self.id(), &state.query)
            .with("destination", state.effective_destination())
            .with("flights", present(state, SlotId::Flights))
            .with("accommodation", present(state, SlotId::Accommodation))
            .with("transportation", present(state, SlotId::Transportation))
            .with("degraded", degraded(state, &searched));
        let plan = perform(&self.registry, WorkerKind::ActivityPlanning, &criteria).await?;
        Ok(StepOutcome::complete(
            StatePatch::new().set(SlotId::Activities, plan),
        ))
    }
}
