//! Shared wiring: one scripted worker per kind and a standard graph over them.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tripgraph::config::{Backoff, EngineConfig};
use tripgraph::memory::MemorySaver;
use tripgraph::steps::standard_graph;
use tripgraph::worker::{ScriptedWorker, Worker, WorkerError, WorkerKind, WorkerRegistry};
use tripgraph::CompiledPlanningGraph;

pub fn config() -> EngineConfig {
    EngineConfig::new(3, Backoff::none(), Duration::from_secs(5), 3)
}

pub fn transient(msg: &str) -> Result<Value, WorkerError> {
    Err(WorkerError::Transient(msg.to_string()))
}

/// One scripted worker per kind. Replace any of them before calling `registry`.
pub struct Workers {
    pub orchestrator: Arc<ScriptedWorker>,
    pub research: Arc<ScriptedWorker>,
    pub flights: Arc<ScriptedWorker>,
    pub accommodation: Arc<ScriptedWorker>,
    pub transportation: Arc<ScriptedWorker>,
    pub activities: Arc<ScriptedWorker>,
    pub budget: Arc<ScriptedWorker>,
}

impl Workers {
    pub fn canned() -> Self {
        Self {
            orchestrator: Arc::new(ScriptedWorker::ok(
                "orchestrator",
                json!({"intent": "leisure"}),
            )),
            research: Arc::new(ScriptedWorker::ok(
                "research",
                json!({"name": "Tokyo", "country": "Japan"}),
            )),
            flights: Arc::new(ScriptedWorker::ok("flights", json!([{"flight": "JL5"}]))),
            accommodation: Arc::new(ScriptedWorker::ok(
                "accommodation",
                json!([{"hotel": "Park Hyatt"}]),
            )),
            transportation: Arc::new(ScriptedWorker::ok(
                "transportation",
                json!({"pass": "JR Pass"}),
            )),
            activities: Arc::new(ScriptedWorker::ok(
                "activities",
                json!({"days": ["Shibuya", "Asakusa"]}),
            )),
            budget: Arc::new(ScriptedWorker::ok(
                "budget",
                json!({"tier": "standard", "total": 2400}),
            )),
        }
    }

    pub fn registry(&self) -> Arc<WorkerRegistry> {
        let mut registry = WorkerRegistry::new();
        let pairs: [(WorkerKind, &Arc<ScriptedWorker>); 7] = [
            (WorkerKind::Orchestrator, &self.orchestrator),
            (WorkerKind::DestinationResearch, &self.research),
            (WorkerKind::FlightSearch, &self.flights),
            (WorkerKind::Accommodation, &self.accommodation),
            (WorkerKind::Transportation, &self.transportation),
            (WorkerKind::ActivityPlanning, &self.activities),
            (WorkerKind::BudgetManagement, &self.budget),
        ];
        for (kind, worker) in pairs {
            let worker: Arc<dyn Worker> = (*worker).clone();
            registry.register_instance(kind, worker);
        }
        Arc::new(registry)
    }

    /// Total worker calls across all kinds.
    pub fn total_calls(&self) -> usize {
        [
            &self.orchestrator,
            &self.research,
            &self.flights,
            &self.accommodation,
            &self.transportation,
            &self.activities,
            &self.budget,
        ]
        .iter()
        .map(|w| w.calls())
        .sum()
    }
}

pub fn graph(workers: &Workers, config: EngineConfig) -> CompiledPlanningGraph {
    standard_graph(workers.registry(), &config)
        .compile(config)
        .unwrap()
}

pub fn graph_with_saver(
    workers: &Workers,
    config: EngineConfig,
    saver: Arc<MemorySaver>,
) -> CompiledPlanningGraph {
    standard_graph(workers.registry(), &config)
        .compile_with_checkpointer(config, saver)
        .unwrap()
}
