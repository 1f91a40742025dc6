//! Step and branch identifiers.

use serde::{Deserialize, Serialize};

use crate::config::StepClass;
use crate::state::{SlotId, Stage};

/// Identifier of a node in the planning graph.
///
/// `ParallelSearch` is the fan-out entry: it has no step function of its own and routes
/// to the three search branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    AnalyzeQuery,
    ResearchDestination,
    ParallelSearch,
    SearchFlights,
    SearchAccommodation,
    PlanTransportation,
    PlanActivities,
    ManageBudget,
    FinalizePlan,
}

impl StepId {
    pub const ALL: [StepId; 9] = [
        StepId::AnalyzeQuery,
        StepId::ResearchDestination,
        StepId::ParallelSearch,
        StepId::SearchFlights,
        StepId::SearchAccommodation,
        StepId::PlanTransportation,
        StepId::PlanActivities,
        StepId::ManageBudget,
        StepId::FinalizePlan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StepId::AnalyzeQuery => "analyze_query",
            StepId::ResearchDestination => "research_destination",
            StepId::ParallelSearch => "parallel_search",
            StepId::SearchFlights => "search_flights",
            StepId::SearchAccommodation => "search_accommodation",
            StepId::PlanTransportation => "plan_transportation",
            StepId::PlanActivities => "plan_activities",
            StepId::ManageBudget => "manage_budget",
            StepId::FinalizePlan => "finalize_plan",
        }
    }

    /// Stage the run is in while this step executes.
    pub fn stage(self) -> Stage {
        match self {
            StepId::AnalyzeQuery => Stage::Analyzing,
            StepId::ResearchDestination => Stage::Researching,
            StepId::ParallelSearch
            | StepId::SearchFlights
            | StepId::SearchAccommodation
            | StepId::PlanTransportation => Stage::ParallelSearch,
            StepId::PlanActivities => Stage::PlanningActivities,
            StepId::ManageBudget => Stage::Budgeting,
            StepId::FinalizePlan => Stage::Finalizing,
        }
    }

    /// The single result slot this step is allowed to write. `None` for the fan-out entry.
    pub fn owned_slot(self) -> Option<SlotId> {
        match self {
            StepId::AnalyzeQuery => Some(SlotId::Analysis),
            StepId::ResearchDestination => Some(SlotId::Destination),
            StepId::ParallelSearch => None,
            StepId::SearchFlights => Some(SlotId::Flights),
            StepId::SearchAccommodation => Some(SlotId::Accommodation),
            StepId::PlanTransportation => Some(SlotId::Transportation),
            StepId::PlanActivities => Some(SlotId::Activities),
            StepId::ManageBudget => Some(SlotId::Budget),
            StepId::FinalizePlan => Some(SlotId::Summary),
        }
    }

    /// Retry class used to look up the attempt budget.
    pub fn class(self) -> StepClass {
        match self {
            StepId::AnalyzeQuery => StepClass::Analysis,
            StepId::ResearchDestination => StepClass::Research,
            StepId::ParallelSearch
            | StepId::SearchFlights
            | StepId::SearchAccommodation
            | StepId::PlanTransportation => StepClass::Search,
            StepId::PlanActivities => StepClass::Planning,
            StepId::ManageBudget => StepClass::Budget,
            StepId::FinalizePlan => StepClass::Finalize,
        }
    }

    /// The branch this step runs as during the parallel phase, if any.
    pub fn branch(self) -> Option<Branch> {
        match self {
            StepId::SearchFlights => Some(Branch::Flights),
            StepId::SearchAccommodation => Some(Branch::Accommodation),
            StepId::PlanTransportation => Some(Branch::Transportation),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three concurrent branches of the parallel-search phase.
///
/// Ordered so that sets of branches iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Flights,
    Accommodation,
    Transportation,
}

impl Branch {
    pub const ALL: [Branch; 3] = [Branch::Flights, Branch::Accommodation, Branch::Transportation];

    pub fn step(self) -> StepId {
        match self {
            Branch::Flights => StepId::SearchFlights,
            Branch::Accommodation => StepId::SearchAccommodation,
            Branch::Transportation => StepId::PlanTransportation,
        }
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Branch::Flights => "flights",
            Branch::Accommodation => "accommodation",
            Branch::Transportation => "transportation",
        })
    }
}
