//! Attempt budgets and fatal failures.

use std::sync::Arc;

use serde_json::json;
use tripgraph::config::StepClass;
use tripgraph::memory::{Checkpointer, MemorySaver};
use tripgraph::state::{ErrorKind, Stage};
use tripgraph::worker::{ScriptedWorker, WorkerError};
use tripgraph::{RunError, StepId, TravelQuery};

use crate::common::{config, graph, graph_with_saver, transient, Workers};

/// **Scenario**: Flights fails twice transiently and succeeds on attempt 3 of 3.
#[tokio::test]
async fn flight_branch_succeeds_on_third_attempt() {
    let mut workers = Workers::canned();
    workers.flights = Arc::new(
        ScriptedWorker::ok("flights", json!([{"flight": "NH9"}]))
            .then([transient("timeout"), transient("rate limited")]),
    );
    let handle = graph(&workers, config())
        .start(TravelQuery::new("Visit Tokyo"))
        .await
        .unwrap();
    let state = handle.state();
    assert_eq!(state.slots.flights.value(), Some(&json!([{"flight": "NH9"}])));
    assert!(!state.slots.flights.is_degraded());
    let flight_errors: Vec<_> = state
        .error_log
        .iter()
        .filter(|e| e.step == StepId::SearchFlights)
        .collect();
    assert_eq!(flight_errors.len(), 2);
    assert!(flight_errors.iter().all(|e| e.kind == ErrorKind::Transient));
    assert_eq!(
        flight_errors.iter().map(|e| e.attempt).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(workers.flights.calls(), 3);
}

/// **Scenario**: A per-class budget caps the attempts of that class.
#[tokio::test]
async fn per_class_budget_caps_attempts() {
    let mut workers = Workers::canned();
    workers.activities = Arc::new(ScriptedWorker::failing(
        "activities",
        WorkerError::Transient("llm overloaded".into()),
    ));
    let cfg = config().with_max_attempts(StepClass::Planning, 2);
    let handle = graph(&workers, cfg)
        .start(TravelQuery::new("Visit Tokyo"))
        .await
        .unwrap();
    assert_eq!(workers.activities.calls(), 2);
    assert!(handle.state().slots.activities.is_degraded());
    assert!(handle.is_complete());
}

/// **Scenario**: Query analysis is not degradable; exhausting it ends the run in ERROR.
#[tokio::test]
async fn analysis_exhaustion_is_fatal() {
    let mut workers = Workers::canned();
    workers.orchestrator = Arc::new(ScriptedWorker::failing(
        "orchestrator",
        WorkerError::Transient("llm unavailable".into()),
    ));
    let saver = Arc::new(MemorySaver::new());
    let g = graph_with_saver(&workers, config(), saver.clone());

    let err = g
        .start_session("fatal", TravelQuery::new("Visit Tokyo"))
        .await
        .unwrap_err();
    match &err {
        RunError::Fatal { step, error_log, .. } => {
            assert_eq!(*step, StepId::AnalyzeQuery);
            assert_eq!(error_log.len(), 3);
        }
        other => panic!("expected Fatal, got {:?}", other),
    }
    assert_eq!(workers.research.calls(), 0);

    let cp = saver.get("fatal").await.unwrap().unwrap();
    assert_eq!(cp.stage, Stage::Error);

    // Resuming a failed run reports the same failure without running anything.
    let again = g.resume("fatal", json!(null)).await.unwrap_err();
    assert_eq!(again.error_log().len(), 3);
    assert_eq!(workers.orchestrator.calls(), 3);
}
