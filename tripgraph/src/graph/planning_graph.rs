//! Planning graph: steps + routes (from → router).
//!
//! Add steps with `add_step`, attach one route per step with `add_route` or
//! `add_fan_out`, pick the entry with `set_entry`, then `compile` or
//! `compile_with_checkpointer` to get a `CompiledPlanningGraph`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::EngineConfig;
use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledPlanningGraph;
use crate::graph::routing::{Route, RouteFn, RoutingTable};
use crate::graph::step::Step;
use crate::graph::{Branch, StepId};
use crate::memory::Checkpointer;

/// Planning graph under construction.
///
/// The fan-out entry (`StepId::ParallelSearch`) has no step of its own; it only needs a
/// fan-out route. Every other id used in a route must be registered with `add_step`.
///
/// **Interaction**: Accepts `Arc<dyn Step>`; produces `CompiledPlanningGraph`.
#[derive(Default)]
pub struct PlanningGraph {
    steps: HashMap<StepId, Arc<dyn Step>>,
    routes: Vec<(StepId, Route)>,
    entry: Option<StepId>,
}

impl PlanningGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a step under its own id. Replaces a step with the same id.
    pub fn add_step(&mut self, step: Arc<dyn Step>) -> &mut Self {
        self.steps.insert(step.id(), step);
        self
    }

    /// Adds a single-successor route: `router` picks one of `targets`, or none to end.
    pub fn add_route(&mut self, from: StepId, targets: &[StepId], router: RouteFn) -> &mut Self {
        self.routes.push((
            from,
            Route::Conditional {
                targets: targets.to_vec(),
                router,
            },
        ));
        self
    }

    /// Adds a fan-out: `router` picks among `branches`; `join` runs after the barrier.
    pub fn add_fan_out(
        &mut self,
        from: StepId,
        branches: &[Branch],
        router: RouteFn,
        join: StepId,
    ) -> &mut Self {
        self.routes.push((
            from,
            Route::FanOut {
                branches: branches.to_vec(),
                router,
                join,
            },
        ));
        self
    }

    pub fn set_entry(&mut self, entry: StepId) -> &mut Self {
        self.entry = Some(entry);
        self
    }

    /// Builds the executable graph without persistence.
    pub fn compile(self, config: EngineConfig) -> Result<CompiledPlanningGraph, CompilationError> {
        self.compile_internal(config, None)
    }

    /// Builds the executable graph with a checkpointer; required for `resume`.
    pub fn compile_with_checkpointer(
        self,
        config: EngineConfig,
        checkpointer: Arc<dyn Checkpointer>,
    ) -> Result<CompiledPlanningGraph, CompilationError> {
        self.compile_internal(config, Some(checkpointer))
    }

    fn compile_internal(
        self,
        config: EngineConfig,
        checkpointer: Option<Arc<dyn Checkpointer>>,
    ) -> Result<CompiledPlanningGraph, CompilationError> {
        config.validate()?;

        let mut table = BTreeMap::new();
        for (from, route) in self.routes {
            if table.insert(from, route).is_some() {
                return Err(CompilationError::DuplicateRoute(from));
            }
        }

        let is_node = |id: &StepId| self.steps.contains_key(id) || table.contains_key(id);

        let entry = self.entry.ok_or(CompilationError::MissingEntry)?;
        if !is_node(&entry) {
            return Err(CompilationError::StepNotFound(entry));
        }

        for (from, route) in &table {
            let is_fan_out = matches!(route, Route::FanOut { .. });
            if !is_fan_out && !self.steps.contains_key(from) {
                return Err(CompilationError::StepNotFound(*from));
            }
            if let Route::FanOut { branches, .. } = route {
                if self.steps.contains_key(from) {
                    return Err(CompilationError::InvalidFanOut {
                        from: *from,
                        reason: "a fan-out entry cannot also be a step".into(),
                    });
                }
                if branches.is_empty() {
                    return Err(CompilationError::InvalidFanOut {
                        from: *from,
                        reason: "no branches".into(),
                    });
                }
                if let Some(b) = branches.iter().find(|b| !self.steps.contains_key(&b.step())) {
                    return Err(CompilationError::StepNotFound(b.step()));
                }
            }
            for target in route.targets() {
                if !is_node(&target) {
                    return Err(CompilationError::StepNotFound(target));
                }
            }
        }

        // Branch steps leave through the join, every other step needs its own route.
        let branch_steps: Vec<StepId> = table
            .values()
            .filter_map(|r| match r {
                Route::FanOut { branches, .. } => Some(branches.iter().map(|b| b.step())),
                _ => None,
            })
            .flatten()
            .collect();
        let mut ids: Vec<StepId> = self.steps.keys().copied().collect();
        ids.sort();
        for id in ids {
            if branch_steps.contains(&id) {
                if table.contains_key(&id) {
                    return Err(CompilationError::InvalidFanOut {
                        from: id,
                        reason: "branch steps cannot have their own route".into(),
                    });
                }
                continue;
            }
            if !table.contains_key(&id) {
                return Err(CompilationError::MissingRoute(id));
            }
        }

        Ok(CompiledPlanningGraph {
            steps: self.steps,
            routes: RoutingTable::new(table),
            entry,
            config: Arc::new(config),
            checkpointer,
            active: Arc::new(DashMap::new()),
        })
    }
}
