//! Routing functions and the static adjacency table.
//!
//! Routers are plain `fn` pointers over `(&PlanningState, &RoutingConfig)`: no captured
//! environment, no I/O, testable without running a step. Error and interrupt edges are not
//! routes; the executor handles them uniformly after every step.

use std::collections::BTreeMap;

use crate::config::RoutingConfig;
use crate::graph::{Branch, StepId};
use crate::state::PlanningState;

/// Router signature: returns the next step ids. An empty list ends the run.
pub type RouteFn = fn(&PlanningState, &RoutingConfig) -> Vec<StepId>;

/// How a step leaves.
#[derive(Clone)]
pub enum Route {
    /// At most one successor chosen by `router` among `targets`.
    Conditional {
        targets: Vec<StepId>,
        router: RouteFn,
    },
    /// All branches returned by `router` run concurrently; `join` runs after the barrier.
    FanOut {
        branches: Vec<Branch>,
        router: RouteFn,
        join: StepId,
    },
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Conditional { targets, .. } => f
                .debug_struct("Conditional")
                .field("targets", targets)
                .finish(),
            Route::FanOut { branches, join, .. } => f
                .debug_struct("FanOut")
                .field("branches", branches)
                .field("join", join)
                .finish(),
        }
    }
}

impl Route {
    /// Every step this route can lead to, in declaration order.
    pub fn targets(&self) -> Vec<StepId> {
        match self {
            Route::Conditional { targets, .. } => targets.clone(),
            Route::FanOut { branches, join, .. } => branches
                .iter()
                .map(|b| b.step())
                .chain(std::iter::once(*join))
                .collect(),
        }
    }
}

/// What the executor does after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Step(StepId),
    FanOut { branches: Vec<Branch>, join: StepId },
    End,
}

/// Adjacency table: step id → route. Built once and never mutated by a run.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: BTreeMap<StepId, Route>,
}

impl RoutingTable {
    pub(crate) fn new(routes: BTreeMap<StepId, Route>) -> Self {
        Self { routes }
    }

    pub fn route(&self, from: StepId) -> Option<&Route> {
        self.routes.get(&from)
    }

    /// `(from, targets)` pairs in step order. Identical graphs list identical edges.
    pub fn edges(&self) -> Vec<(StepId, Vec<StepId>)> {
        self.routes
            .iter()
            .map(|(from, route)| (*from, route.targets()))
            .collect()
    }

    /// Evaluates the route leaving `from`.
    ///
    /// Fails when the router picks a step the route did not declare, or picks more than
    /// one successor on a conditional route.
    pub fn next(
        &self,
        from: StepId,
        state: &PlanningState,
        config: &RoutingConfig,
    ) -> Result<Next, String> {
        let route = self
            .routes
            .get(&from)
            .ok_or_else(|| format!("no route from {}", from))?;
        match route {
            Route::Conditional { targets, router } => {
                let chosen = router(state, config);
                match chosen.as_slice() {
                    [] => Ok(Next::End),
                    [to] if targets.contains(to) => Ok(Next::Step(*to)),
                    [to] => Err(format!("route from {} chose undeclared step {}", from, to)),
                    _ => Err(format!("route from {} chose {} steps", from, chosen.len())),
                }
            }
            Route::FanOut {
                branches,
                router,
                join,
            } => {
                let mut chosen = Vec::new();
                for step in router(state, config) {
                    match step.branch() {
                        Some(b) if branches.contains(&b) => chosen.push(b),
                        _ => {
                            return Err(format!(
                                "fan-out from {} chose non-branch step {}",
                                from, step
                            ))
                        }
                    }
                }
                chosen.sort();
                chosen.dedup();
                Ok(Next::FanOut {
                    branches: chosen,
                    join: *join,
                })
            }
        }
    }

    /// Step that runs once the fan-out leaving `from` has joined.
    pub fn join_target(&self, from: StepId) -> Option<StepId> {
        match self.routes.get(&from) {
            Some(Route::FanOut { join, .. }) => Some(*join),
            _ => None,
        }
    }
}

/// Skips research when the query names a destination, unless configured otherwise.
pub fn route_after_analysis(state: &PlanningState, config: &RoutingConfig) -> Vec<StepId> {
    if state.query.explicit_destination().is_some() && !config.research_known_destinations {
        vec![StepId::ParallelSearch]
    } else {
        vec![StepId::ResearchDestination]
    }
}

pub fn route_after_research(_: &PlanningState, _: &RoutingConfig) -> Vec<StepId> {
    vec![StepId::ParallelSearch]
}

/// Every search branch, every time.
pub fn route_parallel_search(_: &PlanningState, _: &RoutingConfig) -> Vec<StepId> {
    Branch::ALL.iter().map(|b| b.step()).collect()
}

pub fn route_after_activities(_: &PlanningState, _: &RoutingConfig) -> Vec<StepId> {
    vec![StepId::ManageBudget]
}

pub fn route_after_budget(_: &PlanningState, _: &RoutingConfig) -> Vec<StepId> {
    vec![StepId::FinalizePlan]
}

pub fn route_end(_: &PlanningState, _: &RoutingConfig) -> Vec<StepId> {
    Vec::new()
}
