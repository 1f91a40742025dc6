//! Final plan assembly.
//!
//! The plan always lists every section with its status, so a caller can show a partial
//! result instead of failing when some searches degraded.

use serde::Serialize;
use serde_json::Value;

use crate::graph::StepId;
use crate::state::{ErrorEntry, ErrorKind, PlanningState, Slot, SlotId, TravelQuery};

/// Sections reported in the final plan, in presentation order.
pub const PLAN_SECTIONS: [SlotId; 6] = [
    SlotId::Destination,
    SlotId::Flights,
    SlotId::Accommodation,
    SlotId::Transportation,
    SlotId::Activities,
    SlotId::Budget,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Present,
    Degraded,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSection {
    pub slot: SlotId,
    pub status: SectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Something the traveller should know about the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<StepId>,
    pub message: String,
}

/// Caller-facing result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalPlan {
    pub session_id: String,
    pub query: TravelQuery,
    pub sections: Vec<PlanSection>,
    pub summary: Option<Value>,
    pub alerts: Vec<Alert>,
    pub progress: f32,
}

impl FinalPlan {
    pub fn assemble(state: &PlanningState) -> Self {
        let sections = PLAN_SECTIONS
            .iter()
            .map(|slot| section(state, *slot))
            .collect::<Vec<_>>();

        let mut alerts: Vec<Alert> = state.error_log.iter().map(alert_for_entry).collect();
        alerts.extend(
            sections
                .iter()
                .filter(|s| s.status == SectionStatus::Degraded)
                .map(|s| Alert {
                    step: None,
                    message: format!(
                        "{} unavailable: {}",
                        s.slot.as_str(),
                        s.reason.as_deref().unwrap_or("unknown reason")
                    ),
                }),
        );

        Self {
            session_id: state.session_id.clone(),
            query: state.query.clone(),
            sections,
            summary: state.slots.summary.value().cloned(),
            alerts,
            progress: state.progress(),
        }
    }

    pub fn section(&self, slot: SlotId) -> Option<&PlanSection> {
        self.sections.iter().find(|s| s.slot == slot)
    }

    pub fn degraded_sections(&self) -> Vec<SlotId> {
        self.sections
            .iter()
            .filter(|s| s.status == SectionStatus::Degraded)
            .map(|s| s.slot)
            .collect()
    }

    /// True when any section is degraded or missing.
    pub fn is_partial(&self) -> bool {
        self.sections
            .iter()
            .any(|s| s.status != SectionStatus::Present)
    }
}

fn section(state: &PlanningState, slot: SlotId) -> PlanSection {
    let (status, data, reason) = match state.slots.get(slot) {
        Slot::Present(v) => (SectionStatus::Present, Some(v.clone()), None),
        Slot::Degraded { reason } => (SectionStatus::Degraded, None, Some(reason.clone())),
        Slot::Absent => match (slot, state.query.explicit_destination()) {
            (SlotId::Destination, Some(d)) => {
                (SectionStatus::Present, Some(Value::String(d.to_string())), None)
            }
            _ => (SectionStatus::Missing, None, None),
        },
    };
    PlanSection {
        slot,
        status,
        data,
        reason,
    }
}

fn alert_for_entry(entry: &ErrorEntry) -> Alert {
    let message = match entry.kind {
        ErrorKind::JoinTimeout => format!("{} timed out: {}", entry.step, entry.message),
        ErrorKind::MergeConflict => format!("{} conflict: {}", entry.step, entry.message),
        ErrorKind::Unknown => format!("{} failed: {}", entry.step, entry.message),
        ErrorKind::Transient | ErrorKind::Permanent => format!(
            "{} attempt {} failed ({:?}): {}",
            entry.step, entry.attempt, entry.kind, entry.message
        ),
    };
    Alert {
        step: Some(entry.step),
        message,
    }
}
