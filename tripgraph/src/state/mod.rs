//! Planning state: stages, query descriptors, result slots, patches.

mod patch;
mod planning_state;
mod query;
mod slot;
mod stage;

pub use patch::{MergeConflict, StatePatch};
pub use planning_state::{ErrorEntry, ErrorKind, InterruptMarker, PlanningState};
pub use query::{extract_destination, BudgetRange, TravelQuery};
pub use slot::{PlanSlots, Slot, SlotId};
pub use stage::Stage;
