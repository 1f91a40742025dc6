//! Run entry points: plan with default config, with options, or with an explicit config;
//! resume a suspended session; list, delete and prune stored sessions.
//!
//! Re-exports [`run`], [`run_with_options`], [`run_with_config`], [`resume_with_config`]
//! and [`Error`].

pub use crate::config::Error;

mod config_summary;
mod run_with_config;

use tripgraph::{RunHandle, TravelQuery};

use crate::config::{RunConfig, RunOptions};

pub use config_summary::config_summary;
pub use run_with_config::{
    build_graph, delete_session, list_sessions, prune_sessions, resume_with_config,
    run_with_config,
};

/// Plans `query` with default config (from .env), returns the run handle.
///
/// Loads `.env` internally, then calls `run_with_config`.
pub async fn run(query: TravelQuery) -> Result<RunHandle, Error> {
    dotenv::dotenv().ok();
    let config = RunConfig::from_env()?;
    run_with_config(&config, query, None).await
}

/// Plans `query` with config from env and optional overrides (e.g. from CLI args).
///
/// Loads `.env`, builds `RunConfig` from env, applies `options`, then runs the graph.
pub async fn run_with_options(
    query: TravelQuery,
    options: &RunOptions,
) -> Result<RunHandle, Error> {
    dotenv::dotenv().ok();
    let mut config = RunConfig::from_env()?;
    config.apply_options(options);
    run_with_config(&config, query, None).await
}
