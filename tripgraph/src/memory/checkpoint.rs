//! Checkpoint and metadata types.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::graph::{logging, Branch};
use crate::memory::checkpointer::CheckpointError;
use crate::memory::serializer::{JsonSerializer, Serializer};
use crate::state::{PlanningState, Stage};

/// Schema version written by this build.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Why the checkpoint was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointSource {
    /// Run just initialized.
    #[default]
    Start,
    /// After a primary step, before the next one.
    StageBoundary,
    /// Entering the parallel phase with the pending-branch set seeded.
    JoinEntry,
    /// Suspended waiting for external input.
    Interrupt,
    /// Reached COMPLETE or ERROR.
    Terminal,
}

/// Metadata for a single checkpoint (source, step counter, creation time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Number of stages visited when the checkpoint was taken.
    pub step: u64,
    /// Milliseconds since the Unix epoch.
    pub created_at_ms: u64,
}

/// Snapshot of a run sufficient to resume it.
///
/// `stage`, `pending_branches` and `stage_history` are authoritative on restore; the copies
/// inside `state` are overwritten with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Checkpoint {
    /// 0 for checkpoints written before versioning.
    pub version: u32,
    pub session_id: String,
    pub stage: Stage,
    pub pending_branches: BTreeSet<Branch>,
    pub stage_history: Vec<Stage>,
    pub state: PlanningState,
    pub metadata: CheckpointMetadata,
}

/// Item returned by `Checkpointer::list` for housekeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointListItem {
    pub session_id: String,
    pub stage: Stage,
    pub metadata: CheckpointMetadata,
}

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Creation-time cutoff for checkpoints older than `max_age`, in Unix milliseconds.
pub(crate) fn cutoff_ms(max_age: Duration) -> u64 {
    now_ms().saturating_sub(max_age.as_millis() as u64)
}

impl Checkpoint {
    /// Captures `state` as it stands now.
    pub fn capture(state: &PlanningState, source: CheckpointSource) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            session_id: state.session_id.clone(),
            stage: state.stage,
            pending_branches: state.pending_branches.clone(),
            stage_history: state.stage_history.clone(),
            state: state.clone(),
            metadata: CheckpointMetadata {
                source,
                step: state.stage_history.len() as u64,
                created_at_ms: now_ms(),
            },
        }
    }

    /// Rebuilds the planning state, taking position fields from the checkpoint itself.
    pub fn restore(self) -> PlanningState {
        let mut state = self.state;
        if state.session_id.is_empty() {
            state.session_id = self.session_id;
        }
        state.stage = self.stage;
        state.pending_branches = self.pending_branches;
        if !self.stage_history.is_empty() || state.stage_history.is_empty() {
            state.stage_history = self.stage_history;
        }
        state
    }

    pub fn list_item(&self) -> CheckpointListItem {
        CheckpointListItem {
            session_id: self.session_id.clone(),
            stage: self.stage,
            metadata: self.metadata.clone(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CheckpointError> {
        JsonSerializer.serialize(self)
    }

    /// Decodes stored bytes, tolerating older and newer schemas.
    pub fn decode(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Checkpoint = JsonSerializer.deserialize(bytes)?;
        if checkpoint.version > CHECKPOINT_VERSION {
            logging::log_checkpoint_version_ahead(
                &checkpoint.session_id,
                checkpoint.version,
                CHECKPOINT_VERSION,
            );
        }
        Ok(checkpoint)
    }
}
