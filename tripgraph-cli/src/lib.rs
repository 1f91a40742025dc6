//! tripgraph-cli library: run the standard travel-planning graph from the command line
//! or from other crates.
//!
//! Reads engine settings from .env, wires demo workers, runs or resumes a session and
//! returns the run handle.
//!
//! ## Usage
//!
//! ```rust,no_run,ignore
//! let handle = tripgraph_cli::run(TravelQuery::new("Visit Kyoto in November")).await?;
//! println!("{}", tripgraph_cli::render_text(&handle));
//! ```

mod config;
mod demo;
mod report;
mod run;

pub use config::{Error, RunConfig, RunOptions};
pub use demo::{demo_kind, demo_registry, DemoWorker, DEMO_KINDS};
pub use report::{render_json, render_text};
pub use run::{
    build_graph, config_summary, delete_session, list_sessions, prune_sessions,
    resume_with_config, run, run_with_config, run_with_options,
};
pub use tripgraph::{RunHandle, TravelQuery};

#[cfg(test)]
mod tests;
