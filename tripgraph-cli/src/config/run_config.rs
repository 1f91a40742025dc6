//! Run config: attempt budget, backoff, join timeout, concurrency, checkpoint DB.
//! Can be filled from env / .env.
//!
//! Converted to the engine's [`EngineConfig`] by [`RunConfig::to_engine_config`]; the
//! defaults live here, the engine itself assumes none.

use std::str::FromStr;
use std::time::Duration;

use tripgraph::{Backoff, EngineConfig, RoutingConfig, WorkerKind};

use crate::demo::demo_kind;

/// Error type used for config loading and runs.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Run config for the CLI. Can be filled from env / .env.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Attempts per step before it is degraded (or the run fails, for analysis).
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles up to `backoff_max`.
    pub backoff_initial: Duration,
    pub backoff_max: Duration,
    /// Upper bound on the parallel-search join wait.
    pub join_timeout: Duration,
    /// Parallel-search branches in flight at once.
    pub max_concurrency: usize,
    /// Run destination research even when a destination is given.
    pub research_known_destinations: bool,
    /// Suspend for confirmation when the budget worker proposes a tier.
    pub confirm_budget: bool,
    /// SQLite database path for checkpoints. `None` keeps checkpoints in memory.
    pub db_path: Option<String>,
    /// Demo workers that always fail, to exercise retries and degraded sections.
    pub failing_workers: Vec<WorkerKind>,
    /// When true, show debug logs. Requires --verbose.
    pub verbose: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_initial: Duration::from_millis(2_000),
            backoff_max: Duration::from_millis(10_000),
            join_timeout: Duration::from_millis(180_000),
            max_concurrency: 3,
            research_known_destinations: false,
            confirm_budget: false,
            db_path: Some("tripgraph.db".to_string()),
            failing_workers: Vec::new(),
            verbose: false,
        }
    }
}

impl RunConfig {
    /// Fill config from env vars (and .env). Requires `dotenv::dotenv().ok()` beforehand.
    ///
    /// All optional: `TRIP_MAX_ATTEMPTS`, `TRIP_BACKOFF_MS`, `TRIP_BACKOFF_MAX_MS`,
    /// `TRIP_JOIN_TIMEOUT_MS`, `TRIP_MAX_CONCURRENCY`, `TRIP_RESEARCH_KNOWN`,
    /// `TRIP_CONFIRM_BUDGET`, `TRIP_DEMO_FAIL` (comma-separated worker names), `DB_PATH`.
    /// A set but unparsable value is an error.
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();
        let max_attempts = env_or("TRIP_MAX_ATTEMPTS", defaults.max_attempts)?;
        let backoff_initial = env_or(
            "TRIP_BACKOFF_MS",
            defaults.backoff_initial.as_millis() as u64,
        )
        .map(Duration::from_millis)?;
        let backoff_max = env_or(
            "TRIP_BACKOFF_MAX_MS",
            defaults.backoff_max.as_millis() as u64,
        )
        .map(Duration::from_millis)?;
        let join_timeout = env_or(
            "TRIP_JOIN_TIMEOUT_MS",
            defaults.join_timeout.as_millis() as u64,
        )
        .map(Duration::from_millis)?;
        let max_concurrency = env_or("TRIP_MAX_CONCURRENCY", defaults.max_concurrency)?;
        let research_known_destinations = env_flag("TRIP_RESEARCH_KNOWN")?;
        let confirm_budget = env_flag("TRIP_CONFIRM_BUDGET")?;
        let db_path = std::env::var("DB_PATH").ok().or(defaults.db_path);
        let failing_workers = match std::env::var("TRIP_DEMO_FAIL") {
            Ok(raw) => parse_worker_list(&raw)?,
            Err(_) => Vec::new(),
        };
        Ok(Self {
            max_attempts,
            backoff_initial,
            backoff_max,
            join_timeout,
            max_concurrency,
            research_known_destinations,
            confirm_budget,
            db_path,
            failing_workers,
            verbose: false,
        })
    }

    /// Apply optional overrides from `RunOptions` to this config.
    ///
    /// Only set fields in `options` override. `in_memory` drops the DB path even if one
    /// was given.
    pub fn apply_options(&mut self, options: &super::RunOptions) {
        if let Some(n) = options.max_attempts {
            self.max_attempts = n;
        }
        if let Some(n) = options.max_concurrency {
            self.max_concurrency = n;
        }
        if let Some(ms) = options.join_timeout_ms {
            self.join_timeout = Duration::from_millis(ms);
        }
        if options.confirm_budget {
            self.confirm_budget = true;
        }
        if options.db_path.is_some() {
            self.db_path = options.db_path.clone();
        }
        if options.in_memory {
            self.db_path = None;
        }
        for kind in &options.failing_workers {
            if !self.failing_workers.contains(kind) {
                self.failing_workers.push(*kind);
            }
        }
        self.verbose = options.verbose;
    }

    /// Builds the engine configuration. Validation happens when the graph is compiled.
    pub fn to_engine_config(&self) -> EngineConfig {
        let backoff = Backoff {
            initial: self.backoff_initial,
            multiplier: 2.0,
            max: self.backoff_max,
        };
        EngineConfig::new(
            self.max_attempts,
            backoff,
            self.join_timeout,
            self.max_concurrency,
        )
        .with_routing(RoutingConfig {
            research_known_destinations: self.research_known_destinations,
        })
        .with_budget_confirmation(self.confirm_budget)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, Error> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a valid number: {:?}", name, raw),
            )
            .into()
        }),
        Err(_) => Ok(default),
    }
}

/// `1`/`true`/`yes`/`on` and `0`/`false`/`no`/`off`, case-insensitive; unset is false.
fn env_flag(name: &str) -> Result<bool, Error> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} must be a boolean flag: {:?}", name, raw),
        )
        .into()),
    }
}

/// Parses `flights, budget` into worker kinds; blank entries are skipped.
fn parse_worker_list(raw: &str) -> Result<Vec<WorkerKind>, Error> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            demo_kind(name).ok_or_else(|| -> Error {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("unknown worker name: {:?}", name),
                )
                .into()
            })
        })
        .collect()
}
