//! The planning state: the single record threaded through the graph.
//!
//! Owned by the executor for the duration of a run. Steps receive an immutable snapshot
//! and return a [`StatePatch`]; only [`PlanningState::apply`] changes result slots.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::FailureKind;
use crate::graph::{Branch, StepId};

use super::patch::{MergeConflict, StatePatch};
use super::query::TravelQuery;
use super::slot::{PlanSlots, Slot};
use super::stage::Stage;

/// What kind of failure an error-log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transient,
    Permanent,
    /// The branch did not resolve before the join deadline.
    JoinTimeout,
    /// The step produced a patch that violated slot ownership.
    MergeConflict,
    /// A kind this build does not know, read from a checkpoint written by another version.
    #[default]
    #[serde(other)]
    Unknown,
}

impl From<FailureKind> for ErrorKind {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Transient => ErrorKind::Transient,
            FailureKind::Permanent => ErrorKind::Permanent,
        }
    }
}

/// One failed attempt (or timeout) of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub step: StepId,
    /// 1-based attempt number; 0 for failures that are not tied to an attempt.
    #[serde(default)]
    pub attempt: u32,
    #[serde(default)]
    pub kind: ErrorKind,
    #[serde(default)]
    pub message: String,
}

/// Set while the run is suspended waiting for external input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptMarker {
    pub step: StepId,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub payload: Value,
}

/// State of one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlanningState {
    pub session_id: String,
    pub query: TravelQuery,
    pub slots: PlanSlots,
    /// Entries that no longer decode are dropped when a checkpoint is read.
    #[serde(deserialize_with = "lenient_entries")]
    pub error_log: Vec<ErrorEntry>,
    /// Branches of the parallel phase that have not been merged yet.
    pub pending_branches: BTreeSet<Branch>,
    #[serde(deserialize_with = "lenient_marker")]
    pub interrupt: Option<InterruptMarker>,
    pub stage: Stage,
    pub stage_history: Vec<Stage>,
    /// External answers supplied on resume, keyed by the step that asked.
    pub human_input: BTreeMap<StepId, Value>,
    /// Steps (and merged branches) that completed, in completion-merge order.
    pub completed_steps: Vec<StepId>,
}

fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<ErrorEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

fn lenient_marker<'de, D>(deserializer: D) -> Result<Option<InterruptMarker>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|marker| serde_json::from_value(marker).ok()))
}

impl PlanningState {
    /// Fresh state for a new run, positioned at `Analyzing`.
    pub fn new(session_id: impl Into<String>, query: TravelQuery) -> Self {
        Self {
            session_id: session_id.into(),
            query,
            stage: Stage::Analyzing,
            stage_history: vec![Stage::Analyzing],
            ..Default::default()
        }
    }

    /// Moves to `stage` and records it in the history.
    pub(crate) fn enter_stage(&mut self, stage: Stage) {
        self.stage = stage;
        self.stage_history.push(stage);
    }

    /// Applies a patch authored by `author`.
    ///
    /// All checks run before anything is written, so a conflicting patch leaves the state
    /// untouched.
    pub fn apply(&mut self, author: StepId, patch: StatePatch) -> Result<(), MergeConflict> {
        for (slot, _) in &patch.slots {
            if author.owned_slot() != Some(*slot) {
                return Err(MergeConflict::ForeignSlot {
                    step: author,
                    slot: *slot,
                });
            }
            if !self.slots.get(*slot).is_absent() {
                return Err(MergeConflict::SlotAlreadyWritten {
                    step: author,
                    slot: *slot,
                });
            }
        }
        if let Some(target) = patch.inputs.keys().find(|target| **target != author) {
            return Err(MergeConflict::ForeignInput {
                step: author,
                target: *target,
            });
        }
        for (slot, value) in patch.slots {
            if matches!(value, Slot::Absent) {
                continue;
            }
            *self.slots.get_mut(slot) = value;
        }
        self.human_input.extend(patch.inputs);
        Ok(())
    }

    pub(crate) fn record_failure(&mut self, entry: ErrorEntry) {
        self.error_log.push(entry);
    }

    /// External input recorded for `step`, if any.
    pub fn input_for(&self, step: StepId) -> Option<&Value> {
        self.human_input.get(&step)
    }

    /// Destination to plan around: the explicit one, else the researched one.
    pub fn effective_destination(&self) -> Option<Value> {
        if let Some(d) = self.query.explicit_destination() {
            return Some(Value::String(d.to_string()));
        }
        self.slots.destination.value().cloned()
    }

    /// Progress of the run, from the last stage that carries a weight.
    pub fn progress(&self) -> f32 {
        self.stage_history
            .iter()
            .rev()
            .find_map(|s| s.progress())
            .unwrap_or(0.0)
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}
