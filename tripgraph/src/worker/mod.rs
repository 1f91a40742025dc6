//! Worker boundary: the domain collaborators the steps call into.
//!
//! A worker does one thing (search flights, plan activities, ...) and reports either a
//! JSON result or a [`WorkerError`] classified as transient or permanent. How it talks to
//! search APIs, LLMs or browsers is its own business.

mod mock;
mod registry;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{FailureKind, StepFailure};
use crate::graph::StepId;
use crate::state::TravelQuery;

pub use mock::ScriptedWorker;
pub use registry::{WorkerFactory, WorkerRegistry};

/// Kind of domain worker. The registry keeps at most one instance per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkerKind {
    /// Query analysis and final-plan summary.
    Orchestrator,
    DestinationResearch,
    FlightSearch,
    Accommodation,
    Transportation,
    ActivityPlanning,
    BudgetManagement,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 7] = [
        WorkerKind::Orchestrator,
        WorkerKind::DestinationResearch,
        WorkerKind::FlightSearch,
        WorkerKind::Accommodation,
        WorkerKind::Transportation,
        WorkerKind::ActivityPlanning,
        WorkerKind::BudgetManagement,
    ];
}

/// Error from a worker call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkerError {
    #[error("transient worker failure: {0}")]
    Transient(String),
    #[error("permanent worker failure: {0}")]
    Permanent(String),
}

impl WorkerError {
    pub fn kind(&self) -> FailureKind {
        match self {
            WorkerError::Transient(_) => FailureKind::Transient,
            WorkerError::Permanent(_) => FailureKind::Permanent,
        }
    }
}

impl From<WorkerError> for StepFailure {
    fn from(e: WorkerError) -> Self {
        match e {
            WorkerError::Transient(m) => StepFailure::transient(m),
            WorkerError::Permanent(m) => StepFailure::permanent(m),
        }
    }
}

/// What a step hands to its worker: the query plus whatever earlier results it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    pub step: StepId,
    pub query: TravelQuery,
    pub context: Map<String, Value>,
}

impl Criteria {
    pub fn new(step: StepId, query: &TravelQuery) -> Self {
        Self {
            step,
            query: query.clone(),
            context: Map::new(),
        }
    }

    /// Adds a context entry; `None` values are skipped.
    pub fn with(mut self, key: &str, value: Option<Value>) -> Self {
        if let Some(v) = value {
            self.context.insert(key.to_string(), v);
        }
        self
    }
}

/// A long-lived domain worker.
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &str;

    async fn perform(&self, criteria: &Criteria) -> Result<Value, WorkerError>;
}
