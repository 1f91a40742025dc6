//! Graph compilation error.
//!
//! Returned by `PlanningGraph::compile` when routes reference unknown steps, a step has
//! no way forward, or the engine configuration is unusable.

use thiserror::Error;

use crate::config::ConfigError;
use crate::graph::StepId;

/// Error when compiling a planning graph.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A route or the entry names a step that was not registered via `add_step`.
    #[error("step not found: {0}")]
    StepNotFound(StepId),

    /// `set_entry` was never called.
    #[error("graph has no entry step")]
    MissingEntry,

    /// Two routes leave the same step.
    #[error("step {0} has more than one route")]
    DuplicateRoute(StepId),

    /// A registered step has no outgoing route.
    #[error("step {0} has no route")]
    MissingRoute(StepId),

    /// A fan-out lists a step that is not a branch, or no branches at all.
    #[error("invalid fan-out from {from}: {reason}")]
    InvalidFanOut { from: StepId, reason: String },

    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),
}
