//! Stage sequences and topology.

use tripgraph::state::Stage;
use tripgraph::{StepId, TravelQuery};

use crate::common::{config, graph, Workers};

/// **Scenario**: No explicit destination runs research, then the full pipeline.
#[tokio::test]
async fn visit_tokyo_runs_research_then_full_pipeline() {
    let workers = Workers::canned();
    let g = graph(&workers, config());
    let query = TravelQuery::new("Visit Tokyo for a week").with_origin("New York");

    let handle = g.start(query).await.unwrap();
    assert!(handle.is_complete());
    let state = handle.state();
    assert_eq!(
        state.stage_history,
        vec![
            Stage::Analyzing,
            Stage::Researching,
            Stage::ParallelSearch,
            Stage::PlanningActivities,
            Stage::Budgeting,
            Stage::Finalizing,
            Stage::Complete,
        ]
    );
    assert_eq!(workers.research.calls(), 1);
    assert_eq!(
        workers
            .research
            .last_criteria()
            .and_then(|c| c.context.get("candidate_destination").cloned()),
        Some(serde_json::json!("Tokyo"))
    );
    assert_eq!(state.progress(), 1.0);
    let plan = handle.plan().unwrap();
    assert!(!plan.is_partial());
    assert!(plan.alerts.is_empty());
}

/// **Scenario**: Explicit destination "Osaka" skips research.
#[tokio::test]
async fn explicit_destination_skips_research() {
    let workers = Workers::canned();
    let g = graph(&workers, config());
    let query = TravelQuery::new("Weekend trip").with_destination("Osaka");

    let handle = g.start(query).await.unwrap();
    let state = handle.state();
    assert_eq!(&state.stage_history[..2], &[Stage::Analyzing, Stage::ParallelSearch]);
    assert!(!state.stage_history.contains(&Stage::Researching));
    assert_eq!(workers.research.calls(), 0);
    assert!(state.slots.destination.is_absent());
    assert_eq!(
        workers
            .flights
            .last_criteria()
            .and_then(|c| c.context.get("destination").cloned()),
        Some(serde_json::json!("Osaka"))
    );
}

/// **Scenario**: Completed steps are recorded once each, branches in canonical order.
#[tokio::test]
async fn completed_steps_audit_in_order() {
    let workers = Workers::canned();
    let g = graph(&workers, config());
    let handle = g.start(TravelQuery::new("Visit Kyoto")).await.unwrap();
    assert_eq!(
        handle.state().completed_steps,
        vec![
            StepId::AnalyzeQuery,
            StepId::ResearchDestination,
            StepId::SearchFlights,
            StepId::SearchAccommodation,
            StepId::PlanTransportation,
            StepId::PlanActivities,
            StepId::ManageBudget,
            StepId::FinalizePlan,
        ]
    );
}

/// **Scenario**: Identical configuration yields identical topology.
#[tokio::test]
async fn topology_is_deterministic() {
    let a = graph(&Workers::canned(), config());
    let b = graph(&Workers::canned(), config());
    assert_eq!(a.routes().edges(), b.routes().edges());
    assert_eq!(a.entry(), StepId::AnalyzeQuery);
    let edges = a.routes().edges();
    let (_, from_parallel) = edges
        .iter()
        .find(|(from, _)| *from == StepId::ParallelSearch)
        .unwrap();
    assert_eq!(
        from_parallel,
        &vec![
            StepId::SearchFlights,
            StepId::SearchAccommodation,
            StepId::PlanTransportation,
            StepId::PlanActivities,
        ]
    );
}
