//! Optional overrides for a run (CLI args or programmatic).
//!
//! Used by [`RunConfig::apply_options`](super::RunConfig::apply_options). Callers (the
//! binary or tests) build a `RunOptions` and pass it to get env-based config with
//! overrides applied.

use tripgraph::WorkerKind;

/// Optional overrides: attempts, concurrency, budget confirmation, DB path, verbosity.
///
/// All fields are optional; only set fields override the base config (from env).
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Override the attempt budget for every step class.
    pub max_attempts: Option<u32>,
    /// Override the number of parallel-search branches in flight.
    pub max_concurrency: Option<usize>,
    /// Override the join timeout, in milliseconds.
    pub join_timeout_ms: Option<u64>,
    /// Ask for confirmation of the proposed budget tier.
    pub confirm_budget: bool,
    /// Override SQLite database path for checkpoints.
    pub db_path: Option<String>,
    /// Keep checkpoints in memory only (no `resume` across invocations).
    pub in_memory: bool,
    /// Demo workers to make fail, added to any set from env.
    pub failing_workers: Vec<WorkerKind>,
    /// Show debug logs (stage transitions, retries, checkpoints).
    pub verbose: bool,
}
