//! Result slots: one per pipeline phase, each absent, present or degraded.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a result slot in [`PlanSlots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    Analysis,
    Destination,
    Flights,
    Accommodation,
    Transportation,
    Activities,
    Budget,
    Summary,
}

impl SlotId {
    pub const ALL: [SlotId; 8] = [
        SlotId::Analysis,
        SlotId::Destination,
        SlotId::Flights,
        SlotId::Accommodation,
        SlotId::Transportation,
        SlotId::Activities,
        SlotId::Budget,
        SlotId::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlotId::Analysis => "analysis",
            SlotId::Destination => "destination",
            SlotId::Flights => "flights",
            SlotId::Accommodation => "accommodation",
            SlotId::Transportation => "transportation",
            SlotId::Activities => "activities",
            SlotId::Budget => "budget",
            SlotId::Summary => "summary",
        }
    }
}

/// State of one result slot.
///
/// `Degraded` means the owning step was attempted and failed after exhausting its retries
/// (or timed out at the join); plan generation proceeds without it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Slot {
    #[default]
    Absent,
    Present(Value),
    Degraded { reason: String },
}

impl Slot {
    pub fn is_absent(&self) -> bool {
        matches!(self, Slot::Absent)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Slot::Present(_))
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Slot::Degraded { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Slot::Present(v) => Some(v),
            _ => None,
        }
    }
}

/// Per-phase result slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlanSlots {
    pub analysis: Slot,
    pub destination: Slot,
    pub flights: Slot,
    pub accommodation: Slot,
    pub transportation: Slot,
    pub activities: Slot,
    pub budget: Slot,
    pub summary: Slot,
}

impl PlanSlots {
    pub fn get(&self, id: SlotId) -> &Slot {
        match id {
            SlotId::Analysis => &self.analysis,
            SlotId::Destination => &self.destination,
            SlotId::Flights => &self.flights,
            SlotId::Accommodation => &self.accommodation,
            SlotId::Transportation => &self.transportation,
            SlotId::Activities => &self.activities,
            SlotId::Budget => &self.budget,
            SlotId::Summary => &self.summary,
        }
    }

    pub(crate) fn get_mut(&mut self, id: SlotId) -> &mut Slot {
        match id {
            SlotId::Analysis => &mut self.analysis,
            SlotId::Destination => &mut self.destination,
            SlotId::Flights => &mut self.flights,
            SlotId::Accommodation => &mut self.accommodation,
            SlotId::Transportation => &mut self.transportation,
            SlotId::Activities => &mut self.activities,
            SlotId::Budget => &mut self.budget,
            SlotId::Summary => &mut self.summary,
        }
    }
}
