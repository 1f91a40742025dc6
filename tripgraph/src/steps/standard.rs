//! The standard travel-planning topology.
//!
//! ```text
//! analyze_query ──(no destination)──► research_destination ──► parallel_search
//!       └────────(explicit destination)──────────────────────► parallel_search
//! parallel_search ══► search_flights | search_accommodation | plan_transportation
//!                 ══► (join) plan_activities ──► manage_budget ──► finalize_plan ──► END
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::graph::routing::{
    route_after_activities, route_after_analysis, route_after_budget, route_after_research,
    route_end, route_parallel_search,
};
use crate::graph::{Branch, PlanningGraph, StepId};
use crate::worker::WorkerRegistry;

use super::{
    AnalyzeQueryStep, FinalizePlanStep, ManageBudgetStep, PlanActivitiesStep,
    ResearchDestinationStep, SearchStep,
};

/// Builds the standard graph over `registry`. Compile it with the same `config`.
pub fn standard_graph(registry: Arc<WorkerRegistry>, config: &EngineConfig) -> PlanningGraph {
    let mut graph = PlanningGraph::new();
    graph
        .add_step(Arc::new(AnalyzeQueryStep::new(registry.clone())))
        .add_step(Arc::new(ResearchDestinationStep::new(registry.clone())))
        .add_step(Arc::new(SearchStep::flights(registry.clone())))
        .add_step(Arc::new(SearchStep::accommodation(registry.clone())))
        .add_step(Arc::new(SearchStep::transportation(registry.clone())))
        .add_step(Arc::new(PlanActivitiesStep::new(registry.clone())))
        .add_step(Arc::new(ManageBudgetStep::new(
            registry.clone(),
            config.confirm_budget_tier,
        )))
        .add_step(Arc::new(FinalizePlanStep::new(registry)));

    graph
        .set_entry(StepId::AnalyzeQuery)
        .add_route(
            StepId::AnalyzeQuery,
            &[StepId::ResearchDestination, StepId::ParallelSearch],
            route_after_analysis,
        )
        .add_route(
            StepId::ResearchDestination,
            &[StepId::ParallelSearch],
            route_after_research,
        )
        .add_fan_out(
            StepId::ParallelSearch,
            &Branch::ALL,
            route_parallel_search,
            StepId::PlanActivities,
        )
        .add_route(
            StepId::PlanActivities,
            &[StepId::ManageBudget],
            route_after_activities,
        )
        .add_route(
            StepId::ManageBudget,
            &[StepId::FinalizePlan],
            route_after_budget,
        )
        .add_route(StepId::FinalizePlan, &[], route_end);
    graph
}
