//! One-line config summary printed to stderr when `config.verbose` is true.

use crate::config::RunConfig;

/// `attempts=3 backoff=2000..10000ms join_timeout=180000ms concurrency=3 ...`
pub fn config_summary(config: &RunConfig) -> String {
    let store = match &config.db_path {
        Some(path) if cfg!(feature = "sqlite") => format!("sqlite:{}", path),
        _ => "memory".to_string(),
    };
    let failing: Vec<String> = config
        .failing_workers
        .iter()
        .map(|k| format!("{:?}", k))
        .collect();
    format!(
        "attempts={} backoff={}..{}ms join_timeout={}ms concurrency={} research_known={} confirm_budget={} store={} failing=[{}]",
        config.max_attempts,
        config.backoff_initial.as_millis(),
        config.backoff_max.as_millis(),
        config.join_timeout.as_millis(),
        config.max_concurrency,
        config.research_known_destinations,
        config.confirm_budget,
        store,
        failing.join(","),
    )
}
