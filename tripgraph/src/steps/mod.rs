//! Step functions of the travel-planning pipeline.
//!
//! Each step builds [`Criteria`] from the query and the slots it depends on, calls one
//! worker from the shared [`WorkerRegistry`] and returns a patch for its own slot. Only
//! present slots are passed on; degraded ones are listed under `"degraded"` so the worker
//! knows what is missing.

mod activities;
mod analyze;
mod budget;
mod finalize;
mod research;
mod search;
mod standard;

use serde_json::Value;

use crate::error::StepFailure;
use crate::state::{PlanningState, SlotId};
use crate::worker::{Criteria, WorkerKind, WorkerRegistry};

pub use activities::PlanActivitiesStep;
pub use analyze::AnalyzeQueryStep;
pub use budget::{ManageBudgetStep, CONFIRM_TIER_PROMPT};
pub use finalize::FinalizePlanStep;
pub use research::ResearchDestinationStep;
pub use search::SearchStep;
pub use standard::standard_graph;

async fn perform(
    registry: &WorkerRegistry,
    kind: WorkerKind,
    criteria: &Criteria,
) -> Result<Value, StepFailure> {
    let worker = registry.get(kind).await?;
    Ok(worker.perform(criteria).await?)
}

fn present(state: &PlanningState, slot: SlotId) -> Option<Value> {
    state.slots.get(slot).value().cloned()
}

/// Names of the given slots that are degraded, as a JSON array (or `None` if none are).
fn degraded(state: &PlanningState, slots: &[SlotId]) -> Option<Value> {
    let names: Vec<Value> = slots
        .iter()
        .filter(|s| state.slots.get(**s).is_degraded())
        .map(|s| Value::String(s.as_str().to_string()))
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(Value::Array(names))
    }
}
