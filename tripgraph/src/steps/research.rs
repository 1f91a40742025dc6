//! Destination research, run only when the query names no destination.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StepFailure;
use crate::graph::{Step, StepId, StepOutcome};
use crate::state::{PlanningState, SlotId, StatePatch};
use crate::worker::{Criteria, WorkerKind, WorkerRegistry};

use super::{perform, present};

pub struct ResearchDestinationStep {
    registry: Arc<WorkerRegistry>,
}

impl ResearchDestinationStep {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Step for ResearchDestinationStep {
    fn id(&self) -> StepId {
        StepId::ResearchDestination
    }

    async fn execute(&self, state: &PlanningState) -> Result<StepOutcome, StepFailure> {
        let analysis = present(state, SlotId::Analysis);
        let candidate = analysis
            .as_ref()
            .and_then(|a| a.get("candidate_destination"))
            .cloned();
        let criteria = Criteria::new(self.id(), &state.query)
            .with("analysis", analysis)
            .with("candidate_destination", candidate);
        let destination =
            perform(&self.registry, WorkerKind::DestinationResearch, &criteria).await?;
        Ok(StepOutcome::complete(
            StatePatch::new().set(SlotId::Destination, destination),
        ))
    }
}
