//! Query analysis: the only step whose failure ends the run.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StepFailure;
use crate::graph::{Step, StepId, StepOutcome};
use crate::state::{extract_destination, PlanningState, SlotId, StatePatch};
use crate::worker::{Criteria, WorkerKind, WorkerRegistry};

use super::perform;

/// Asks the orchestrator worker to analyze the query.
///
/// Without an explicit destination, a candidate pulled from the free text is passed to the
/// worker and recorded in the analysis slot as `candidate_destination`. The query itself
/// is never changed, so routing still sends the run through research.
pub struct AnalyzeQueryStep {
    registry: Arc<WorkerRegistry>,
}

impl AnalyzeQueryStep {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Step for AnalyzeQueryStep {
    fn id(&self) -> StepId {
        StepId::AnalyzeQuery
    }

    fn degradable(&self) -> bool {
        false
    }

    async fn execute(&self, state: &PlanningState) -> Result<StepOutcome, StepFailure> {
        let candidate = match state.query.explicit_destination() {
            Some(_) => None,
            None => extract_destination(&state.query.raw_query).map(Value::String),
        };
        let criteria = Criteria::new(self.id(), &state.query)
            .with("candidate_destination", candidate.clone());
        let mut analysis = perform(&self.registry, WorkerKind::Orchestrator, &criteria).await?;
        if let (Some(c), Value::Object(map)) = (candidate, &mut analysis) {
            map.entry("candidate_destination").or_insert(c);
        }
        Ok(StepOutcome::complete(
            StatePatch::new().set(SlotId::Analysis, analysis),
        ))
    }
}
