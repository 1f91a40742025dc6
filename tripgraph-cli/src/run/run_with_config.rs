//! Builds the standard planning graph from a [`RunConfig`] and drives sessions on it.
//!
//! Checkpoints go to SQLite at `db_path` when the `sqlite` feature is on and a path is
//! set; otherwise to an in-memory store that lives as long as the graph.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tripgraph::memory::CheckpointListItem;
use tripgraph::steps::standard_graph;
use tripgraph::{
    Checkpointer, CompiledPlanningGraph, MemorySaver, RunHandle, TravelQuery, WorkerRegistry,
};

use super::config_summary;
use crate::config::{Error, RunConfig};
use crate::demo::demo_registry;

/// Opens the checkpoint store selected by `config`.
fn checkpointer(config: &RunConfig) -> Result<Arc<dyn Checkpointer>, Error> {
    #[cfg(feature = "sqlite")]
    if let Some(path) = &config.db_path {
        let saver = tripgraph::memory::SqliteSaver::new(path)?;
        return Ok(Arc::new(saver));
    }
    #[cfg(not(feature = "sqlite"))]
    if config.db_path.is_some() {
        tracing::warn!("built without sqlite; checkpoints stay in memory");
    }
    Ok(Arc::new(MemorySaver::new()))
}

/// Compiles the standard graph over `registry` (demo workers when `None`).
pub fn build_graph(
    config: &RunConfig,
    registry: Option<WorkerRegistry>,
) -> Result<CompiledPlanningGraph, Error> {
    let engine = config.to_engine_config();
    let registry =
        Arc::new(registry.unwrap_or_else(|| demo_registry(&config.failing_workers)));
    let graph = standard_graph(registry, &engine);
    Ok(graph.compile_with_checkpointer(engine, checkpointer(config)?)?)
}

/// Plans `query` as a new session.
///
/// When `config.verbose` is true, prints the config summary to stderr first.
pub async fn run_with_config(
    config: &RunConfig,
    query: TravelQuery,
    registry: Option<WorkerRegistry>,
) -> Result<RunHandle, Error> {
    if config.verbose {
        eprintln!("{}", config_summary(config));
    }
    let graph = build_graph(config, registry)?;
    Ok(graph.start(query).await?)
}

/// Resumes `session_id` with `input` as the answer to its pending question.
pub async fn resume_with_config(
    config: &RunConfig,
    session_id: &str,
    input: Value,
    registry: Option<WorkerRegistry>,
) -> Result<RunHandle, Error> {
    if config.verbose {
        eprintln!("{}", config_summary(config));
    }
    let graph = build_graph(config, registry)?;
    Ok(graph.resume(session_id, input).await?)
}

/// Most recent stored sessions, newest first.
pub async fn list_sessions(
    config: &RunConfig,
    limit: usize,
) -> Result<Vec<CheckpointListItem>, Error> {
    Ok(checkpointer(config)?.list(limit).await?)
}

/// Deletes the stored checkpoint of `session_id`. Returns whether one existed.
pub async fn delete_session(config: &RunConfig, session_id: &str) -> Result<bool, Error> {
    Ok(checkpointer(config)?.delete(session_id).await?)
}

/// Deletes sessions whose latest checkpoint is older than `max_age`. Returns how many.
pub async fn prune_sessions(config: &RunConfig, max_age: Duration) -> Result<usize, Error> {
    let removed = checkpointer(config)?.prune_older_than(max_age).await?;
    tracing::info!(removed, max_age_secs = max_age.as_secs(), "pruned stored sessions");
    Ok(removed)
}
