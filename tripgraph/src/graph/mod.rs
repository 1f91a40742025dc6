//! Planning graph: steps + routing table, compile, then start or resume runs.
//!
//! Build a [`PlanningGraph`] (or use `steps::standard_graph`), compile it with an
//! [`EngineConfig`](crate::config::EngineConfig) and optionally a checkpointer, then call
//! `start` / `resume` on the [`CompiledPlanningGraph`].

mod compile_error;
mod compiled;
mod join;
pub mod logging;
mod planning_graph;
mod retry;
pub mod routing;
mod run_handle;
mod step;
mod step_id;

pub use compile_error::CompilationError;
pub use compiled::CompiledPlanningGraph;
pub use planning_graph::PlanningGraph;
pub use routing::{Next, Route, RouteFn, RoutingTable};
pub use run_handle::{ExecutorState, RunHandle, RunOutcome};
pub use step::{InterruptRequest, Step, StepOutcome};
pub use step_id::{Branch, StepId};
