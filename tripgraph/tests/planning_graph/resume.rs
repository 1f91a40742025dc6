//! Checkpoint/resume: equivalence with uninterrupted runs, mid-join resume, legacy
//! payloads, persistence across processes and concurrent resume.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tripgraph::memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointSource, Checkpointer, MemorySaver,
};
use tripgraph::plan::SectionStatus;
use tripgraph::state::{PlanningState, Slot, Stage};
use tripgraph::worker::ScriptedWorker;
use tripgraph::{Branch, RunError, SlotId, TravelQuery};

use crate::common::{config, graph_with_saver, Workers};

/// Checkpointer that keeps every checkpoint it is handed.
#[derive(Default)]
struct RecordingSaver {
    inner: MemorySaver,
    history: Mutex<Vec<Checkpoint>>,
}

#[async_trait]
impl Checkpointer for RecordingSaver {
    async fn put(&self, session_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        self.history.lock().unwrap().push(checkpoint.clone());
        self.inner.put(session_id, checkpoint).await
    }

    async fn get(&self, session_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        self.inner.get(session_id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        self.inner.list(limit).await
    }

    async fn delete(&self, session_id: &str) -> Result<bool, CheckpointError> {
        self.inner.delete(session_id).await
    }
}

/// **Scenario**: Resuming from any checkpoint of a run reaches the same final state as
/// the uninterrupted run.
#[tokio::test]
async fn resume_from_every_checkpoint_matches_uninterrupted_run() {
    let recorder = Arc::new(RecordingSaver::default());
    let g = Workers::canned();
    let full = tripgraph::steps::standard_graph(g.registry(), &config())
        .compile_with_checkpointer(config(), recorder.clone())
        .unwrap()
        .start_session("trip", TravelQuery::new("Visit Tokyo for a week"))
        .await
        .unwrap();
    let expected = full.state().clone();
    let checkpoints = recorder.history.lock().unwrap().clone();
    assert!(checkpoints
        .iter()
        .any(|c| c.metadata.source == CheckpointSource::JoinEntry));

    for cp in checkpoints.iter().filter(|c| c.stage != Stage::Complete) {
        let workers = Workers::canned();
        let saver = Arc::new(MemorySaver::new());
        saver.put("trip", cp).await.unwrap();
        let resumed = graph_with_saver(&workers, config(), saver)
            .resume("trip", json!(null))
            .await
            .unwrap();
        assert_eq!(
            resumed.state(),
            &expected,
            "resume from {:?} diverged",
            cp.stage
        );
        if cp.stage == Stage::Budgeting {
            assert_eq!(workers.flights.calls(), 0);
            assert_eq!(workers.activities.calls(), 0);
        }
    }
}

/// **Scenario**: Resuming mid-join re-invokes only the branches still pending.
#[tokio::test]
async fn mid_join_resume_runs_only_pending_branches() {
    let mut state = PlanningState::new("join", TravelQuery::new("Trip").with_destination("Nara"));
    state.stage = Stage::ParallelSearch;
    state.stage_history.push(Stage::ParallelSearch);
    state.slots.flights = Slot::Present(json!(["ITM"]));
    state.slots.transportation = Slot::Present(json!({"pass": "Kintetsu"}));
    state.pending_branches.insert(Branch::Accommodation);
    let saver = Arc::new(MemorySaver::new());
    saver
        .put("join", &Checkpoint::capture(&state, CheckpointSource::JoinEntry))
        .await
        .unwrap();

    let workers = Workers::canned();
    let handle = graph_with_saver(&workers, config(), saver)
        .resume("join", json!(null))
        .await
        .unwrap();
    assert!(handle.is_complete());
    assert_eq!(workers.accommodation.calls(), 1);
    assert_eq!(workers.flights.calls(), 0);
    assert_eq!(workers.transportation.calls(), 0);
    assert_eq!(handle.state().slots.flights.value(), Some(&json!(["ITM"])));
    assert!(handle.state().slots.accommodation.is_present());
}

/// **Scenario**: Results of a join are not checkpointed one by one, so a crash after the
/// join-entry checkpoint re-runs every branch on resume.
#[tokio::test]
async fn crash_mid_join_reruns_all_branches() {
    let recorder = Arc::new(RecordingSaver::default());
    let first = Workers::canned();
    tripgraph::steps::standard_graph(first.registry(), &config())
        .compile_with_checkpointer(config(), recorder.clone())
        .unwrap()
        .start_session("crash", TravelQuery::new("Visit Tokyo"))
        .await
        .unwrap();
    let history = recorder.history.lock().unwrap().clone();
    assert!(history
        .iter()
        .all(|c| c.pending_branches.is_empty() || c.pending_branches.len() == Branch::ALL.len()));
    let join_entry = history
        .iter()
        .find(|c| c.metadata.source == CheckpointSource::JoinEntry)
        .cloned()
        .unwrap();

    let saver = Arc::new(MemorySaver::new());
    saver.put("crash", &join_entry).await.unwrap();
    let workers = Workers::canned();
    let handle = graph_with_saver(&workers, config(), saver)
        .resume("crash", json!(null))
        .await
        .unwrap();
    assert!(handle.is_complete());
    assert_eq!(workers.flights.calls(), 1);
    assert_eq!(workers.accommodation.calls(), 1);
    assert_eq!(workers.transportation.calls(), 1);
}

/// **Scenario**: A store that only implements put/get/list/delete still prunes by age.
#[tokio::test]
async fn default_prune_goes_through_list_and_delete() {
    let recorder = RecordingSaver::default();
    let state = PlanningState::new("old", TravelQuery::new("Visit Rome"));
    let mut old = Checkpoint::capture(&state, CheckpointSource::Terminal);
    old.metadata.created_at_ms -= Duration::from_secs(3 * 86_400).as_millis() as u64;
    recorder.put("old", &old).await.unwrap();
    let fresh = PlanningState::new("fresh", TravelQuery::new("Visit Milan"));
    recorder
        .put("fresh", &Checkpoint::capture(&fresh, CheckpointSource::Start))
        .await
        .unwrap();

    let removed = recorder
        .prune_older_than(Duration::from_secs(86_400))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(recorder.get("old").await.unwrap().is_none());
    assert!(recorder.get("fresh").await.unwrap().is_some());
}

/// **Scenario**: A checkpoint written before versioning (missing fields) still resumes.
#[tokio::test]
async fn legacy_checkpoint_resumes() {
    let saver = Arc::new(MemorySaver::new());
    saver
        .put_raw(
            "legacy",
            br#"{
                "session_id": "legacy",
                "stage": "BUDGETING",
                "state": {
                    "query": {"raw_query": "Visit Rome", "destination": "Rome"},
                    "slots": {"flights": {"status": "present", "data": ["FCO"]}},
                    "retired_field": true
                }
            }"#
            .to_vec(),
        )
        .await;

    let workers = Workers::canned();
    let handle = graph_with_saver(&workers, config(), saver)
        .resume("legacy", json!(null))
        .await
        .unwrap();
    assert!(handle.is_complete());
    assert_eq!(workers.budget.calls(), 1);
    assert_eq!(workers.flights.calls(), 0);
    let plan = handle.plan().unwrap();
    assert_eq!(
        plan.section(SlotId::Activities).unwrap().status,
        SectionStatus::Missing
    );
    assert_eq!(
        plan.section(SlotId::Flights).unwrap().status,
        SectionStatus::Present
    );
}

/// **Scenario**: A second run call for a session that is already running is rejected.
#[tokio::test(start_paused = true)]
async fn concurrent_resume_is_session_busy() {
    let mut workers = Workers::canned();
    workers.flights = Arc::new(
        ScriptedWorker::ok("flights", json!(["HND"])).with_delay(Duration::from_millis(200)),
    );
    let g = graph_with_saver(&workers, config(), Arc::new(MemorySaver::new()));

    let runner = g.clone();
    let first = tokio::spawn(async move {
        runner
            .start_session("busy", TravelQuery::new("Visit Tokyo"))
            .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    match g.resume("busy", json!(null)).await {
        Err(RunError::SessionBusy(id)) => assert_eq!(id, "busy"),
        other => panic!("expected SessionBusy, got {:?}", other),
    }
    let handle = first.await.unwrap().unwrap();
    assert!(handle.is_complete());

    // The claim is released once the first call returns.
    let again = g.resume("busy", json!(null)).await.unwrap();
    assert!(again.is_complete());
}

/// **Scenario**: A run suspended in one process resumes from SQLite in another.
#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_checkpoint_survives_restart() {
    use tripgraph::memory::SqliteSaver;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trips.db");
    let cfg = config().with_budget_confirmation(true);
    {
        let workers = Workers::canned();
        let saver = Arc::new(SqliteSaver::new(&path).unwrap());
        let g = tripgraph::steps::standard_graph(workers.registry(), &cfg)
            .compile_with_checkpointer(cfg.clone(), saver)
            .unwrap();
        let handle = g
            .start_session("persisted", TravelQuery::new("Visit Tokyo"))
            .await
            .unwrap();
        assert!(handle.interrupt().is_some());
    }

    let workers = Workers::canned();
    let saver = Arc::new(SqliteSaver::new(&path).unwrap());
    let listed = saver.list(10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].stage, Stage::Interrupted);
    let g = tripgraph::steps::standard_graph(workers.registry(), &cfg)
        .compile_with_checkpointer(cfg.clone(), saver.clone())
        .unwrap();
    let handle = g.resume("persisted", json!({"approved": true})).await.unwrap();
    assert!(handle.is_complete());
    assert_eq!(workers.flights.calls(), 0);
    assert!(saver.delete("persisted").await.unwrap());
}
