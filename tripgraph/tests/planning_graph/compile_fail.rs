//! PlanningGraph compile failure cases: unknown steps, missing routes, bad fan-outs.

use std::sync::Arc;
use std::time::Duration;

use tripgraph::config::{Backoff, ConfigError, EngineConfig};
use tripgraph::graph::routing::{route_after_budget, route_end, route_parallel_search};
use tripgraph::steps::{FinalizePlanStep, ManageBudgetStep};
use tripgraph::{Branch, CompilationError, PlanningGraph, StepId};

use crate::common::{config, Workers};

fn budget_and_finalize() -> PlanningGraph {
    let registry = Workers::canned().registry();
    let mut graph = PlanningGraph::new();
    graph
        .add_step(Arc::new(ManageBudgetStep::new(registry.clone(), false)))
        .add_step(Arc::new(FinalizePlanStep::new(registry)));
    graph
}

#[test]
fn compile_succeeds_for_minimal_chain() {
    let mut graph = budget_and_finalize();
    graph
        .set_entry(StepId::ManageBudget)
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget)
        .add_route(StepId::FinalizePlan, &[], route_end);
    assert!(graph.compile(config()).is_ok());
}

#[test]
fn compile_fails_without_entry() {
    let mut graph = budget_and_finalize();
    graph
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget)
        .add_route(StepId::FinalizePlan, &[], route_end);
    assert!(matches!(
        graph.compile(config()),
        Err(CompilationError::MissingEntry)
    ));
}

#[test]
fn compile_fails_when_route_targets_unknown_step() {
    let mut graph = budget_and_finalize();
    graph
        .set_entry(StepId::ManageBudget)
        .add_route(StepId::ManageBudget, &[StepId::PlanActivities], route_after_budget)
        .add_route(StepId::FinalizePlan, &[], route_end);
    match graph.compile(config()) {
        Err(CompilationError::StepNotFound(id)) => assert_eq!(id, StepId::PlanActivities),
        _ => panic!("expected StepNotFound"),
    }
}

#[test]
fn compile_fails_on_duplicate_route() {
    let mut graph = budget_and_finalize();
    graph
        .set_entry(StepId::ManageBudget)
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget)
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget)
        .add_route(StepId::FinalizePlan, &[], route_end);
    match graph.compile(config()) {
        Err(CompilationError::DuplicateRoute(id)) => assert_eq!(id, StepId::ManageBudget),
        _ => panic!("expected DuplicateRoute"),
    }
}

#[test]
fn compile_fails_when_step_has_no_route() {
    let mut graph = budget_and_finalize();
    graph
        .set_entry(StepId::ManageBudget)
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget);
    match graph.compile(config()) {
        Err(CompilationError::MissingRoute(id)) => assert_eq!(id, StepId::FinalizePlan),
        _ => panic!("expected MissingRoute"),
    }
}

#[test]
fn compile_fails_when_fan_out_branch_is_missing() {
    let mut graph = budget_and_finalize();
    graph
        .set_entry(StepId::ParallelSearch)
        .add_fan_out(
            StepId::ParallelSearch,
            &Branch::ALL,
            route_parallel_search,
            StepId::ManageBudget,
        )
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget)
        .add_route(StepId::FinalizePlan, &[], route_end);
    match graph.compile(config()) {
        Err(CompilationError::StepNotFound(id)) => assert_eq!(id, StepId::SearchFlights),
        _ => panic!("expected StepNotFound for the flights branch"),
    }
}

#[test]
fn compile_fails_on_empty_fan_out() {
    let mut graph = budget_and_finalize();
    graph
        .set_entry(StepId::ParallelSearch)
        .add_fan_out(StepId::ParallelSearch, &[], route_parallel_search, StepId::ManageBudget)
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget)
        .add_route(StepId::FinalizePlan, &[], route_end);
    assert!(matches!(
        graph.compile(config()),
        Err(CompilationError::InvalidFanOut { .. })
    ));
}

#[test]
fn compile_fails_on_invalid_config() {
    let mut graph = budget_and_finalize();
    graph
        .set_entry(StepId::ManageBudget)
        .add_route(StepId::ManageBudget, &[StepId::FinalizePlan], route_after_budget)
        .add_route(StepId::FinalizePlan, &[], route_end);
    let cfg = EngineConfig::new(3, Backoff::none(), Duration::from_secs(1), 0);
    match graph.compile(cfg) {
        Err(CompilationError::Config(e)) => assert_eq!(e, ConfigError::ZeroConcurrency),
        _ => panic!("expected Config error"),
    }
}
