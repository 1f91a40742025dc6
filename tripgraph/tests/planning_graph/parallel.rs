//! Parallel phase: join barrier, degraded branches, timeout, order independence.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tripgraph::plan::SectionStatus;
use tripgraph::state::{ErrorKind, Slot};
use tripgraph::worker::{ScriptedWorker, WorkerError};
use tripgraph::{SlotId, StepId, TravelQuery};

use crate::common::{config, graph, Workers};

/// **Scenario**: Accommodation exhausts its retries; the plan marks it degraded and the
/// later steps only see flights and transportation.
#[tokio::test]
async fn exhausted_branch_degrades_and_run_continues() {
    let mut workers = Workers::canned();
    workers.accommodation = Arc::new(ScriptedWorker::failing(
        "accommodation",
        WorkerError::Transient("booking API down".into()),
    ));
    let g = graph(&workers, config());

    let handle = g.start(TravelQuery::new("Visit Tokyo")).await.unwrap();
    assert!(handle.is_complete());
    let state = handle.state();
    assert!(state.slots.accommodation.is_degraded());
    assert!(state.slots.flights.is_present());
    assert!(state.slots.transportation.is_present());
    assert_eq!(workers.accommodation.calls(), 3);

    let activity_ctx = workers.activities.last_criteria().unwrap().context;
    assert!(activity_ctx.contains_key("flights"));
    assert!(activity_ctx.contains_key("transportation"));
    assert!(!activity_ctx.contains_key("accommodation"));
    assert_eq!(activity_ctx["degraded"], json!(["accommodation"]));
    let budget_ctx = workers.budget.last_criteria().unwrap().context;
    assert!(!budget_ctx.contains_key("accommodation"));

    let plan = handle.plan().unwrap();
    assert_eq!(plan.degraded_sections(), vec![SlotId::Accommodation]);
    assert_eq!(
        plan.section(SlotId::Flights).unwrap().status,
        SectionStatus::Present
    );
    // Three failed attempts plus the degraded section.
    assert_eq!(plan.alerts.len(), 4);
}

/// **Scenario**: All three branches fail; the join still completes and the run finishes.
#[tokio::test]
async fn join_completes_when_every_branch_fails() {
    let mut workers = Workers::canned();
    let permanent = || WorkerError::Permanent("no results".into());
    workers.flights = Arc::new(ScriptedWorker::failing("flights", permanent()));
    workers.accommodation = Arc::new(ScriptedWorker::failing("accommodation", permanent()));
    workers.transportation = Arc::new(ScriptedWorker::failing("transportation", permanent()));
    let g = graph(&workers, config());

    let handle = g.start(TravelQuery::new("Visit Tokyo")).await.unwrap();
    assert!(handle.is_complete());
    let state = handle.state();
    for slot in [&state.slots.flights, &state.slots.accommodation, &state.slots.transportation] {
        assert!(slot.is_degraded());
    }
    assert!(state.slots.activities.is_present());
    assert!(state.pending_branches.is_empty());
    // Permanent failures are not retried.
    assert_eq!(workers.flights.calls(), 1);
}

/// **Scenario**: A branch slower than the join timeout is cancelled and degraded.
#[tokio::test(start_paused = true)]
async fn slow_branch_hits_join_timeout() {
    let mut workers = Workers::canned();
    workers.transportation = Arc::new(
        ScriptedWorker::ok("transportation", json!({"pass": "late"}))
            .with_delay(Duration::from_secs(600)),
    );
    let mut cfg = config();
    cfg.join_timeout = Duration::from_secs(2);
    let g = graph(&workers, cfg);

    let started = tokio::time::Instant::now();
    let handle = g.start(TravelQuery::new("Visit Tokyo")).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(600));
    let state = handle.state();
    assert!(handle.is_complete());
    assert!(matches!(state.slots.transportation, Slot::Degraded { .. }));
    assert!(state.slots.flights.is_present());
    assert!(state
        .error_log
        .iter()
        .any(|e| e.step == StepId::PlanTransportation && e.kind == ErrorKind::JoinTimeout));
}

/// **Scenario**: Different completion orders give the same final state.
#[tokio::test(start_paused = true)]
async fn merge_is_order_independent() {
    let delays = [[10u64, 20, 30], [30, 20, 10], [20, 30, 10]];
    let mut finals = Vec::new();
    for [f, a, t] in delays {
        let mut workers = Workers::canned();
        workers.flights = Arc::new(
            ScriptedWorker::ok("flights", json!([{"flight": "JL5"}]))
                .with_delay(Duration::from_millis(f)),
        );
        workers.accommodation = Arc::new(
            ScriptedWorker::ok("accommodation", json!([{"hotel": "Park Hyatt"}]))
                .with_delay(Duration::from_millis(a)),
        );
        workers.transportation = Arc::new(
            ScriptedWorker::ok("transportation", json!({"pass": "JR Pass"}))
                .with_delay(Duration::from_millis(t)),
        );
        let g = graph(&workers, config());
        let mut state = g
            .start_session("same-session", TravelQuery::new("Visit Tokyo"))
            .await
            .unwrap()
            .state()
            .clone();
        state.session_id.clear();
        finals.push(state);
    }
    assert_eq!(finals[0], finals[1]);
    assert_eq!(finals[1], finals[2]);
}

/// **Scenario**: Concurrency 1 still resolves every branch.
#[tokio::test]
async fn concurrency_one_resolves_all_branches() {
    let workers = Workers::canned();
    let mut cfg = config();
    cfg.max_concurrency = 1;
    let handle = graph(&workers, cfg)
        .start(TravelQuery::new("Visit Tokyo"))
        .await
        .unwrap();
    let state = handle.state();
    assert!(state.slots.flights.is_present());
    assert!(state.slots.accommodation.is_present());
    assert!(state.slots.transportation.is_present());
}
