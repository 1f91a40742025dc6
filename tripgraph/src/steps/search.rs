//! The three parallel-search branches: flights, accommodation, transportation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StepFailure;
use crate::graph::{Branch, Step, StepId, StepOutcome};
use crate::state::{PlanningState, StatePatch};
use crate::worker::{Criteria, WorkerKind, WorkerRegistry};

use super::perform;

/// One search branch. Reads only the query and the destination, writes only its own slot.
pub struct SearchStep {
    branch: Branch,
    registry: Arc<WorkerRegistry>,
}

impl SearchStep {
    pub fn new(branch: Branch, registry: Arc<WorkerRegistry>) -> Self {
        Self { branch, registry }
    }

    pub fn flights(registry: Arc<WorkerRegistry>) -> Self {
        Self::new(Branch::Flights, registry)
    }

    pub fn accommodation(registry: Arc<WorkerRegistry>) -> Self {
        Self::new(Branch::Accommodation, registry)
    }

    pub fn transportation(registry: Arc<WorkerRegistry>) -> Self {
        Self::new(Branch::Transportation, registry)
    }

    fn worker_kind(&self) -> WorkerKind {
        match self.branch {
            Branch::Flights => WorkerKind::FlightSearch,
            Branch::Accommodation => WorkerKind::Accommodation,
            Branch::Transportation => WorkerKind::Transportation,
        }
    }
}

#[async_trait]
impl Step for SearchStep {
    fn id(&self) -> StepId {
        self.branch.step()
    }

    async fn execute(&self, state: &PlanningState) -> Result<StepOutcome, StepFailure> {
        let slot = self
            .id()
            .owned_slot()
            .ok_or_else(|| StepFailure::permanent(format!("{} owns no slot", self.id())))?;
        let criteria = Criteria::new(self.id(), &state.query)
            .with("destination", state.effective_destination())
            .with("human_input", state.input_for(self.id()).cloned());
        let options = perform(&self.registry, self.worker_kind(), &criteria).await?;
        Ok(StepOutcome::complete(StatePatch::new().set(slot, options)))
    }
}
