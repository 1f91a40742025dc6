//! # tripgraph
//!
//! Orchestration engine for a multi-step travel-planning pipeline. Independent workers
//! (destination research, flight search, accommodation, transportation, activity planning,
//! budget management) each fill one slot of a shared plan; the engine decides what runs
//! when and what happens when something fails.
//!
//! ## Design Principles
//!
//! - **One state, patched**: a single [`PlanningState`] flows through the graph. Steps read
//!   a snapshot and return a [`StatePatch`]; each step may write only the slot it owns.
//! - **Fixed topology**: the graph is a static routing table built once; routers are pure
//!   functions over state and [`RoutingConfig`](config::RoutingConfig).
//! - **Partial results first**: failed searches degrade their slot instead of failing the
//!   run, and the parallel join is bounded by a timeout.
//! - **Resumable**: a checkpoint is written at every stage boundary; `resume` continues a
//!   crashed or suspended run without re-running completed steps.
//!
//! ## Main Modules
//!
//! - [`graph`]: `PlanningGraph`, `CompiledPlanningGraph`, `Step`, routing, `RunHandle`.
//! - [`steps`]: the step functions and [`standard_graph`](steps::standard_graph).
//! - [`worker`]: `Worker` trait, `WorkerRegistry`, `ScriptedWorker` for tests.
//! - [`state`]: `PlanningState`, slots, patches, stages and the travel query.
//! - [`memory`]: `Checkpointer`, `MemorySaver`, optional `SqliteSaver`.
//! - [`plan`]: `FinalPlan` with per-section status and alerts.
//! - [`config`]: `EngineConfig`, `Backoff`, per-class attempt budgets.
//!
//! ## Features
//!
//! - `sqlite` (default): persistent checkpointer.
//! - `tracing` (default): structured logging; stderr fallback when off.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use serde_json::json;
//! use tripgraph::config::{Backoff, EngineConfig};
//! use tripgraph::memory::MemorySaver;
//! use tripgraph::steps::standard_graph;
//! use tripgraph::worker::{ScriptedWorker, WorkerKind, WorkerRegistry};
//! use tripgraph::TravelQuery;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = WorkerRegistry::new();
//! for kind in WorkerKind::ALL {
//!     registry.register_instance(kind, Arc::new(ScriptedWorker::ok("canned", json!({}))));
//! }
//! let config = EngineConfig::new(3, Backoff::none(), Duration::from_secs(30), 3);
//! let graph = standard_graph(Arc::new(registry), &config)
//!     .compile_with_checkpointer(config, Arc::new(MemorySaver::new()))?;
//!
//! let handle = graph.start(TravelQuery::new("Visit Tokyo for a week")).await?;
//! if let Some(plan) = handle.plan() {
//!     println!("partial: {}", plan.is_partial());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
pub mod plan;
pub mod state;
pub mod steps;
pub mod worker;

pub use config::{Backoff, EngineConfig, RoutingConfig, StepClass};
pub use error::{FailureKind, RunError, StepFailure};
pub use graph::{
    Branch, CompilationError, CompiledPlanningGraph, ExecutorState, PlanningGraph, RunHandle,
    RunOutcome, Step, StepId, StepOutcome,
};
pub use memory::{Checkpoint, Checkpointer, MemorySaver};
pub use plan::{FinalPlan, SectionStatus};
pub use state::{PlanningState, Slot, SlotId, Stage, StatePatch, TravelQuery};
pub use worker::{Worker, WorkerError, WorkerKind, WorkerRegistry};
