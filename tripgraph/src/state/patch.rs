//! State patches and the merge that applies them.
//!
//! Each step owns exactly one slot. A patch from a step may only fill that slot, and
//! only while it is still absent; anything else is a [`MergeConflict`]. Because parallel
//! branches own disjoint slots, merging their patches in any order gives the same state.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::graph::StepId;

use super::slot::{Slot, SlotId};

/// A sparse update produced by one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub(crate) slots: BTreeMap<SlotId, Slot>,
    pub(crate) inputs: BTreeMap<StepId, Value>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `slot` present with `value`.
    pub fn set(mut self, slot: SlotId, value: Value) -> Self {
        self.slots.insert(slot, Slot::Present(value));
        self
    }

    /// Marks `slot` degraded.
    pub fn degrade(mut self, slot: SlotId, reason: impl Into<String>) -> Self {
        self.slots.insert(
            slot,
            Slot::Degraded {
                reason: reason.into(),
            },
        );
        self
    }

    /// Records an externally supplied answer for `step` (used on resume).
    pub fn with_input(mut self, step: StepId, input: Value) -> Self {
        self.inputs.insert(step, input);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty() && self.inputs.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = (&SlotId, &Slot)> {
        self.slots.iter()
    }
}

/// A patch that would break slot ownership. Always a defect in a step, never overwritten.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeConflict {
    /// The step wrote a slot it does not own.
    #[error("step {step} wrote slot {slot:?} it does not own")]
    ForeignSlot { step: StepId, slot: SlotId },

    /// The slot already holds a result from an earlier write.
    #[error("step {step} wrote slot {slot:?} which is already filled")]
    SlotAlreadyWritten { step: StepId, slot: SlotId },

    /// The step supplied an external input on behalf of another step.
    #[error("step {step} recorded input for {target}")]
    ForeignInput { step: StepId, target: StepId },
}
