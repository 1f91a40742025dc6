//! Pipeline stages.
//!
//! A stage names the phase the run is in. Non-terminal stages map one-to-one onto
//! the step that runs in that phase, which is what lets a checkpoint record only the
//! stage and still be resumed. `Complete` and `Error` are terminal.

use serde::{Deserialize, Serialize};

use crate::graph::StepId;

/// Stage of a planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Analyzing,
    Researching,
    ParallelSearch,
    PlanningActivities,
    Budgeting,
    Finalizing,
    Interrupted,
    Error,
    Complete,
}

impl Stage {
    /// True for `Complete` and `Error`; no transition leaves a terminal stage.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Error)
    }

    /// The step that runs while the run is in this stage.
    ///
    /// `None` for `Interrupted` (the interrupt marker names the step) and for terminal stages.
    pub fn step(self) -> Option<StepId> {
        match self {
            Stage::Analyzing => Some(StepId::AnalyzeQuery),
            Stage::Researching => Some(StepId::ResearchDestination),
            Stage::ParallelSearch => Some(StepId::ParallelSearch),
            Stage::PlanningActivities => Some(StepId::PlanActivities),
            Stage::Budgeting => Some(StepId::ManageBudget),
            Stage::Finalizing => Some(StepId::FinalizePlan),
            Stage::Interrupted | Stage::Error | Stage::Complete => None,
        }
    }

    /// Fraction of the pipeline done once this stage is reached (0.0 to 1.0).
    ///
    /// `Interrupted` and `Error` carry no weight of their own; callers keep the last
    /// progress value seen before them (see `PlanningState::progress`).
    pub fn progress(self) -> Option<f32> {
        match self {
            Stage::Analyzing => Some(0.0),
            Stage::Researching => Some(0.1),
            Stage::ParallelSearch => Some(0.2),
            Stage::PlanningActivities => Some(0.6),
            Stage::Budgeting => Some(0.8),
            Stage::Finalizing => Some(0.9),
            Stage::Complete => Some(1.0),
            Stage::Interrupted | Stage::Error => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Analyzing => "ANALYZING",
            Stage::Researching => "RESEARCHING",
            Stage::ParallelSearch => "PARALLEL_SEARCH",
            Stage::PlanningActivities => "PLANNING_ACTIVITIES",
            Stage::Budgeting => "BUDGETING",
            Stage::Finalizing => "FINALIZING",
            Stage::Interrupted => "INTERRUPTED",
            Stage::Error => "ERROR",
            Stage::Complete => "COMPLETE",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
