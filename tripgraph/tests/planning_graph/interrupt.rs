//! Human-in-the-loop: budget-tier confirmation and branch interrupts.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tripgraph::config::EngineConfig;
use tripgraph::graph::routing::{
    route_after_activities, route_after_budget, route_end, route_parallel_search,
};
use tripgraph::memory::MemorySaver;
use tripgraph::state::{PlanningState, SlotId, Stage, StatePatch};
use tripgraph::steps::{
    FinalizePlanStep, ManageBudgetStep, PlanActivitiesStep, SearchStep, CONFIRM_TIER_PROMPT,
};
use tripgraph::{Branch, PlanningGraph, RunError, Step, StepFailure, StepId, StepOutcome, TravelQuery};

use crate::common::{config, graph_with_saver, Workers};

fn confirming() -> EngineConfig {
    config().with_budget_confirmation(true)
}

/// **Scenario**: Budget asks to confirm its tier; resume with approval completes the run
/// without re-running earlier steps.
#[tokio::test]
async fn budget_tier_confirmation_suspends_and_resumes() {
    let workers = Workers::canned();
    let saver = Arc::new(MemorySaver::new());
    let g = graph_with_saver(&workers, confirming(), saver);

    let handle = g
        .start_session("trip-1", TravelQuery::new("Visit Tokyo for a week"))
        .await
        .unwrap();
    let marker = handle.interrupt().cloned().expect("suspended");
    assert_eq!(marker.step, StepId::ManageBudget);
    assert_eq!(marker.prompt, CONFIRM_TIER_PROMPT);
    assert_eq!(marker.payload, json!({"tier": "standard"}));
    assert_eq!(handle.state().stage, Stage::Interrupted);
    assert!(handle.state().slots.budget.is_absent());

    let calls_before = (
        workers.research.calls(),
        workers.flights.calls(),
        workers.activities.calls(),
    );
    let handle = g.resume("trip-1", json!({"approved": true})).await.unwrap();
    assert!(handle.is_complete());
    let state = handle.state();
    assert_eq!(state.stage, Stage::Complete);
    assert!(state.interrupt.is_none());
    assert!(state.slots.budget.is_present());
    assert_eq!(
        state.input_for(StepId::ManageBudget),
        Some(&json!({"approved": true}))
    );
    assert_eq!(
        (
            workers.research.calls(),
            workers.flights.calls(),
            workers.activities.calls(),
        ),
        calls_before
    );
    assert_eq!(
        state
            .completed_steps
            .iter()
            .filter(|s| **s == StepId::ManageBudget)
            .count(),
        1
    );
    assert_eq!(
        &state.stage_history[state.stage_history.len() - 4..],
        &[Stage::Interrupted, Stage::Budgeting, Stage::Finalizing, Stage::Complete]
    );
}

/// **Scenario**: Rejecting the tier degrades the budget section; the run still completes.
#[tokio::test]
async fn rejected_tier_degrades_budget() {
    let workers = Workers::canned();
    let g = graph_with_saver(&workers, confirming(), Arc::new(MemorySaver::new()));
    g.start_session("trip-2", TravelQuery::new("Visit Tokyo"))
        .await
        .unwrap();
    let handle = g.resume("trip-2", json!({"approved": false})).await.unwrap();
    assert!(handle.is_complete());
    assert!(handle.state().slots.budget.is_degraded());
}

/// **Scenario**: Resume without a checkpointer or without a checkpoint is an error.
#[tokio::test]
async fn resume_unknown_session_is_no_checkpoint() {
    let workers = Workers::canned();
    let g = graph_with_saver(&workers, confirming(), Arc::new(MemorySaver::new()));
    match g.resume("nobody", json!({})).await {
        Err(RunError::NoCheckpoint(id)) => assert_eq!(id, "nobody"),
        other => panic!("expected NoCheckpoint, got {:?}", other),
    }
}

/// Transportation branch that needs the traveller to pick between rail and car.
struct PickTransportStep;

#[async_trait]
impl Step for PickTransportStep {
    fn id(&self) -> StepId {
        StepId::PlanTransportation
    }

    async fn execute(&self, state: &PlanningState) -> Result<StepOutcome, StepFailure> {
        match state.input_for(self.id()).and_then(|v| v.get("mode")) {
            Some(mode) => Ok(StepOutcome::complete(
                StatePatch::new().set(SlotId::Transportation, json!({"mode": mode})),
            )),
            None => Ok(StepOutcome::interrupt("pick_mode", json!({"options": ["rail", "car"]}))),
        }
    }
}

/// **Scenario**: A branch interrupt suspends after the other branches merge; resume
/// re-runs only that branch.
#[tokio::test]
async fn branch_interrupt_reruns_only_that_branch() {
    let workers = Workers::canned();
    let registry = workers.registry();
    let cfg = config();
    let mut graph = PlanningGraph::new();
    graph
        .add_step(Arc::new(SearchStep::flights(registry.clone())))
        .add_step(Arc::new(SearchStep::accommodation(registry.clone())))
        .add_step(Arc::new(PickTransportStep))
        .add_step(Arc::new(PlanActivitiesStep::new(registry.clone())))
        .add_step(Arc::new(ManageBudgetStep::new(registry.clone(), false)))
        .add_step(Arc::new(FinalizePlanStep::new(registry)))
        .set_entry(StepId::ParallelSearch)
        .add_fan_out(
            StepId::ParallelSearch,
            &Branch::ALL,
            route_parallel_search,
            StepId::PlanActivities,
        )
        .add_route(StepId::PlanActivities, &[StepId::ManageBudget], route_after_activities)
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget)
        .add_route(StepId::FinalizePlan, &[], route_end);
    let g = graph
        .compile_with_checkpointer(cfg, Arc::new(MemorySaver::new()))
        .unwrap();

    let handle = g
        .start_session("trip-3", TravelQuery::new("Trip").with_destination("Hokkaido"))
        .await
        .unwrap();
    let marker = handle.interrupt().cloned().unwrap();
    assert_eq!(marker.step, StepId::PlanTransportation);
    let state = handle.state();
    assert!(state.slots.flights.is_present());
    assert!(state.slots.accommodation.is_present());
    assert_eq!(
        state.pending_branches.iter().copied().collect::<Vec<_>>(),
        vec![Branch::Transportation]
    );

    let handle = g.resume("trip-3", json!({"mode": "rail"})).await.unwrap();
    assert!(handle.is_complete());
    assert_eq!(
        handle.state().slots.transportation.value(),
        Some(&json!({"mode": "rail"}))
    );
    assert_eq!(workers.flights.calls(), 1);
    assert_eq!(workers.accommodation.calls(), 1);
}
