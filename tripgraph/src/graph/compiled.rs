//! Compiled planning graph: immutable, runs and resumes sessions.
//!
//! Built by `PlanningGraph::compile` or `compile_with_checkpointer`. Holds the steps, the
//! routing table and the engine configuration. When a checkpointer is set, a checkpoint is
//! written at every stage boundary, before and after the parallel phase, on interrupt and
//! on reaching a terminal stage.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::RunError;
use crate::graph::join::{self, BranchResolution};
use crate::graph::retry::run_with_retry;
use crate::graph::routing::{Next, Route, RoutingTable};
use crate::graph::run_handle::{ExecutorState, RunHandle, RunOutcome};
use crate::graph::step::{InterruptRequest, Step, StepOutcome};
use crate::graph::{logging, Branch, StepId};
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer};
use crate::plan::FinalPlan;
use crate::state::{
    ErrorEntry, ErrorKind, InterruptMarker, PlanningState, Stage, StatePatch, TravelQuery,
};

/// Compiled graph: immutable structure, supports `start` and `resume`.
///
/// One coordinating task drives each run; only the parallel phase spawns tasks. At most
/// one `start`/`resume` may drive a given session at a time.
#[derive(Clone)]
pub struct CompiledPlanningGraph {
    pub(super) steps: HashMap<StepId, Arc<dyn Step>>,
    pub(super) routes: RoutingTable,
    pub(super) entry: StepId,
    pub(super) config: Arc<EngineConfig>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer>>,
    /// Sessions currently being driven by this graph.
    pub(super) active: Arc<DashMap<String, ()>>,
}

/// Releases the session claim when the run call returns.
struct SessionGuard {
    active: Arc<DashMap<String, ()>>,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.active.remove(&self.session_id);
    }
}

impl CompiledPlanningGraph {
    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn entry(&self) -> StepId {
        self.entry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer>> {
        self.checkpointer.as_ref()
    }

    /// Starts a run under a fresh session id.
    pub async fn start(&self, query: TravelQuery) -> Result<RunHandle, RunError> {
        self.start_session(Uuid::new_v4().to_string(), query).await
    }

    /// Starts a run under `session_id`, replacing any checkpoint stored for it.
    pub async fn start_session(
        &self,
        session_id: impl Into<String>,
        query: TravelQuery,
    ) -> Result<RunHandle, RunError> {
        let session_id = session_id.into();
        let _guard = self.claim(&session_id)?;
        logging::log_run_start(&session_id, false);

        let mut state = PlanningState::new(session_id, query);
        let entry_stage = self.entry.stage();
        if state.stage != entry_stage {
            state.stage = entry_stage;
            state.stage_history = vec![entry_stage];
        }
        self.save(&state, CheckpointSource::Start).await?;
        self.drive(state, ExecutorState::Ready).await
    }

    /// Continues `session_id` from its latest checkpoint.
    ///
    /// If the run is suspended, `input` is recorded as the answer for the step that asked
    /// and only that step (or the still-pending branches) runs again. Otherwise `input` is
    /// ignored and the run continues from the recorded stage.
    pub async fn resume(&self, session_id: &str, input: Value) -> Result<RunHandle, RunError> {
        let _guard = self.claim(session_id)?;
        let checkpointer = self
            .checkpointer
            .as_ref()
            .ok_or_else(|| RunError::NoCheckpoint(session_id.to_string()))?;
        let checkpoint = checkpointer
            .get(session_id)
            .await?
            .ok_or_else(|| RunError::NoCheckpoint(session_id.to_string()))?;
        logging::log_run_start(session_id, true);

        let mut state = checkpoint.restore();
        let position = match ExecutorState::from_state(&state) {
            ExecutorState::Suspended(marker) => {
                state.interrupt = None;
                let step = marker.step;
                self.merge(
                    &mut state,
                    step,
                    StatePatch::new().with_input(step, input),
                    false,
                )
                .await?;
                self.enter(&mut state, step.stage());
                match step.branch() {
                    Some(branch) => {
                        state.pending_branches.insert(branch);
                        ExecutorState::AwaitingJoin(state.pending_branches.clone())
                    }
                    None => ExecutorState::Running(step.stage()),
                }
            }
            ExecutorState::Terminal(Stage::Error) => return Err(self.fatal_from_log(&state)),
            position => position,
        };
        self.drive(state, position).await
    }

    /// Latest checkpointed state of `session_id`, if any.
    pub async fn load(&self, session_id: &str) -> Result<Option<PlanningState>, RunError> {
        match &self.checkpointer {
            Some(cp) => Ok(cp.get(session_id).await?.map(Checkpoint::restore)),
            None => Ok(None),
        }
    }

    fn claim(&self, session_id: &str) -> Result<SessionGuard, RunError> {
        match self.active.entry(session_id.to_string()) {
            Entry::Occupied(_) => Err(RunError::SessionBusy(session_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(SessionGuard {
                    active: self.active.clone(),
                    session_id: session_id.to_string(),
                })
            }
        }
    }

    /// Runs the state machine until the run suspends or reaches a terminal stage.
    async fn drive(
        &self,
        mut state: PlanningState,
        mut position: ExecutorState,
    ) -> Result<RunHandle, RunError> {
        loop {
            position = match position {
                ExecutorState::Ready => ExecutorState::Running(self.entry.stage()),
                ExecutorState::Running(stage) => {
                    let step = stage.step().ok_or_else(|| {
                        RunError::Misconfigured(format!("stage {} has no step", stage))
                    })?;
                    if let Some(Route::FanOut { .. }) = self.routes.route(step) {
                        self.enter_fan_out(&mut state, step).await?
                    } else {
                        self.run_step(&mut state, step).await?
                    }
                }
                ExecutorState::AwaitingJoin(pending) => self.run_join(&mut state, pending).await?,
                ExecutorState::Suspended(interrupt) => {
                    return Ok(RunHandle {
                        session_id: state.session_id.clone(),
                        outcome: RunOutcome::Suspended {
                            state: Box::new(state),
                            interrupt,
                        },
                    });
                }
                ExecutorState::Terminal(Stage::Complete) => {
                    logging::log_run_complete(&state.session_id, state.error_log.len());
                    let plan = FinalPlan::assemble(&state);
                    return Ok(RunHandle {
                        session_id: state.session_id.clone(),
                        outcome: RunOutcome::Completed {
                            state: Box::new(state),
                            plan,
                        },
                    });
                }
                ExecutorState::Terminal(_) => return Err(self.fatal_from_log(&state)),
            };
        }
    }

    async fn run_step(
        &self,
        state: &mut PlanningState,
        id: StepId,
    ) -> Result<ExecutorState, RunError> {
        let step = self
            .steps
            .get(&id)
            .cloned()
            .ok_or_else(|| RunError::Misconfigured(format!("step {} is not registered", id)))?;
        logging::log_step_start(&state.session_id, id);

        let report = run_with_retry(
            step.as_ref(),
            state,
            self.config.attempts_for(id.class()),
            self.config.backoff,
        )
        .await;
        state.error_log.extend(report.failures);

        match report.result {
            Ok(StepOutcome::Complete { patch }) => {
                self.merge(state, id, patch, true).await?;
                self.advance(state, id).await
            }
            Ok(StepOutcome::Interrupt(request)) => self.suspend(state, id, request).await,
            Err(failure) if step.degradable() => {
                self.degrade(state, id, &failure.message).await?;
                self.advance(state, id).await
            }
            Err(failure) => Err(self.fail(state, id, failure.message).await),
        }
    }

    /// Seeds the pending set (unless resuming with one) and checkpoints before the join.
    async fn enter_fan_out(
        &self,
        state: &mut PlanningState,
        fan_out: StepId,
    ) -> Result<ExecutorState, RunError> {
        if state.pending_branches.is_empty() {
            match self
                .routes
                .next(fan_out, state, &self.config.routing)
                .map_err(RunError::Misconfigured)?
            {
                Next::FanOut { branches, .. } => state.pending_branches.extend(branches),
                other => {
                    return Err(RunError::Misconfigured(format!(
                        "{} is not a fan-out (routes to {:?})",
                        fan_out, other
                    )))
                }
            }
        }
        if state.pending_branches.is_empty() {
            return self.finish_join(state, fan_out).await;
        }
        self.save(state, CheckpointSource::JoinEntry).await?;
        Ok(ExecutorState::AwaitingJoin(state.pending_branches.clone()))
    }

    /// Runs the pending branches and merges their results in branch order.
    ///
    /// The pending set is checkpointed only on join entry and on suspension. A process that
    /// dies while branches are running resumes with the whole pending set and runs every
    /// branch in it again, including branches that had already finished. Branches merged
    /// before an interrupt are not re-run.
    async fn run_join(
        &self,
        state: &mut PlanningState,
        mut pending: BTreeSet<Branch>,
    ) -> Result<ExecutorState, RunError> {
        let fan_out = state
            .stage
            .step()
            .filter(|s| self.routes.join_target(*s).is_some())
            .ok_or_else(|| {
                RunError::Misconfigured(format!("stage {} has no fan-out", state.stage))
            })?;

        let mut branches: Vec<(Branch, Arc<dyn Step>)> = Vec::with_capacity(pending.len());
        for branch in &pending {
            let step = self.steps.get(&branch.step()).cloned().ok_or_else(|| {
                RunError::Misconfigured(format!("branch {} is not registered", branch))
            })?;
            branches.push((*branch, step));
        }

        let snapshot = Arc::new(state.clone());
        let reports = join::run_branches(branches, snapshot, &self.config).await;

        let mut interrupted: Option<(StepId, InterruptRequest)> = None;
        for (branch, report) in reports {
            let id = branch.step();
            state.error_log.extend(report.failures);
            match report.resolution {
                BranchResolution::Completed(patch) => {
                    self.merge(state, id, patch, true).await?;
                    pending.remove(&branch);
                }
                BranchResolution::Failed(failure) => {
                    let degradable = self.steps.get(&id).map_or(true, |s| s.degradable());
                    if !degradable {
                        state.pending_branches = pending;
                        return Err(self.fail(state, id, failure.message).await);
                    }
                    self.degrade(state, id, &failure.message).await?;
                    pending.remove(&branch);
                }
                BranchResolution::TimedOut => {
                    let message = format!(
                        "no result within {} ms",
                        self.config.join_timeout.as_millis()
                    );
                    state.record_failure(ErrorEntry {
                        step: id,
                        attempt: 0,
                        kind: ErrorKind::JoinTimeout,
                        message: message.clone(),
                    });
                    self.degrade(state, id, &message).await?;
                    pending.remove(&branch);
                }
                BranchResolution::Interrupted(request) => {
                    if interrupted.is_none() {
                        interrupted = Some((id, request));
                    }
                }
            }
        }
        state.pending_branches = pending;

        if let Some((id, request)) = interrupted {
            return self.suspend(state, id, request).await;
        }
        self.finish_join(state, fan_out).await
    }

    async fn finish_join(
        &self,
        state: &mut PlanningState,
        fan_out: StepId,
    ) -> Result<ExecutorState, RunError> {
        state.pending_branches.clear();
        let join = self
            .routes
            .join_target(fan_out)
            .ok_or_else(|| RunError::Misconfigured(format!("{} has no join target", fan_out)))?;
        self.transition(state, Next::Step(join)).await
    }

    async fn advance(
        &self,
        state: &mut PlanningState,
        from: StepId,
    ) -> Result<ExecutorState, RunError> {
        let next = self
            .routes
            .next(from, state, &self.config.routing)
            .map_err(RunError::Misconfigured)?;
        self.transition(state, next).await
    }

    async fn transition(
        &self,
        state: &mut PlanningState,
        next: Next,
    ) -> Result<ExecutorState, RunError> {
        match next {
            Next::Step(to) => {
                let stage = to.stage();
                self.enter(state, stage);
                self.save(state, CheckpointSource::StageBoundary).await?;
                Ok(ExecutorState::Running(stage))
            }
            Next::End => {
                self.enter(state, Stage::Complete);
                self.save(state, CheckpointSource::Terminal).await?;
                Ok(ExecutorState::Terminal(Stage::Complete))
            }
            Next::FanOut { .. } => Err(RunError::Misconfigured(
                "fan-out reached outside a fan-out route".into(),
            )),
        }
    }

    /// Applies `patch` authored by `id`. A conflict is a defect and ends the run.
    async fn merge(
        &self,
        state: &mut PlanningState,
        id: StepId,
        patch: StatePatch,
        completes_step: bool,
    ) -> Result<(), RunError> {
        match state.apply(id, patch) {
            Ok(()) => {
                if completes_step {
                    state.completed_steps.push(id);
                }
                Ok(())
            }
            Err(conflict) => {
                let message = conflict.to_string();
                state.record_failure(ErrorEntry {
                    step: id,
                    attempt: 0,
                    kind: ErrorKind::MergeConflict,
                    message: message.clone(),
                });
                Err(self.fail(state, id, message).await)
            }
        }
    }

    async fn degrade(
        &self,
        state: &mut PlanningState,
        id: StepId,
        reason: &str,
    ) -> Result<(), RunError> {
        logging::log_degraded(&state.session_id, id, reason);
        match id.owned_slot() {
            Some(slot) => {
                self.merge(state, id, StatePatch::new().degrade(slot, reason), false)
                    .await
            }
            None => Ok(()),
        }
    }

    async fn suspend(
        &self,
        state: &mut PlanningState,
        id: StepId,
        request: InterruptRequest,
    ) -> Result<ExecutorState, RunError> {
        logging::log_interrupt(&state.session_id, id, &request.prompt);
        let marker = InterruptMarker {
            step: id,
            prompt: request.prompt,
            payload: request.payload,
        };
        state.interrupt = Some(marker.clone());
        self.enter(state, Stage::Interrupted);
        self.save(state, CheckpointSource::Interrupt).await?;
        Ok(ExecutorState::Suspended(marker))
    }

    /// Moves the run to ERROR, checkpoints it and builds the fatal error.
    async fn fail(&self, state: &mut PlanningState, id: StepId, message: String) -> RunError {
        logging::log_run_error(&state.session_id, id, &message);
        self.enter(state, Stage::Error);
        if let Err(err) = self.save(state, CheckpointSource::Terminal).await {
            logging::log_checkpoint_failed(&state.session_id, &err.to_string());
        }
        RunError::Fatal {
            session_id: state.session_id.clone(),
            step: id,
            message,
            error_log: state.error_log.clone(),
        }
    }

    fn fatal_from_log(&self, state: &PlanningState) -> RunError {
        let (step, message) = state
            .error_log
            .last()
            .map(|e| (e.step, e.message.clone()))
            .unwrap_or((self.entry, "run ended in error".to_string()));
        RunError::Fatal {
            session_id: state.session_id.clone(),
            step,
            message,
            error_log: state.error_log.clone(),
        }
    }

    fn enter(&self, state: &mut PlanningState, stage: Stage) {
        logging::log_stage_transition(&state.session_id, state.stage, stage);
        state.enter_stage(stage);
    }

    async fn save(&self, state: &PlanningState, source: CheckpointSource) -> Result<(), RunError> {
        if let Some(cp) = &self.checkpointer {
            cp.put(&state.session_id, &Checkpoint::capture(state, source))
                .await?;
            logging::log_checkpoint(&state.session_id, state.stage);
        }
        Ok(())
    }
}
