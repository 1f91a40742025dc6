//! Engine configuration.
//!
//! Always supplied by the caller: the engine assumes no attempt counts, timeouts or
//! concurrency limits of its own. [`EngineConfig::validate`] runs before every run.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

/// Retry class of a step. Attempt budgets are configured per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepClass {
    Analysis,
    Research,
    Search,
    Planning,
    Budget,
    Finalize,
}

/// Exponential backoff between attempts: `initial * multiplier^(n-1)`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub initial: Duration,
    pub multiplier: f64,
    pub max: Duration,
}

impl Backoff {
    /// Delay to wait after the `attempt`-th failure (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(32) as i32;
        let factor = self.multiplier.max(1.0).powi(exp);
        let nanos = (self.initial.as_nanos() as f64 * factor).round();
        if !nanos.is_finite() || nanos >= self.max.as_nanos() as f64 {
            self.max
        } else {
            Duration::from_nanos(nanos as u64)
        }
    }

    /// No waiting between attempts.
    pub fn none() -> Self {
        Self {
            initial: Duration::ZERO,
            multiplier: 1.0,
            max: Duration::ZERO,
        }
    }
}

/// Parameters of the pure routing functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Run destination research even when the query names an explicit destination.
    pub research_known_destinations: bool,
}

/// Configuration consumed by the graph executor.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Attempt budget for classes without an override.
    pub default_max_attempts: u32,
    pub max_attempts: BTreeMap<StepClass, u32>,
    pub backoff: Backoff,
    /// Upper bound on the parallel-search join wait.
    pub join_timeout: Duration,
    /// Maximum number of parallel-search branches in flight at once.
    pub max_concurrency: usize,
    pub routing: RoutingConfig,
    /// Ask for human confirmation when the budget worker proposes a tier.
    pub confirm_budget_tier: bool,
}

/// Configuration that cannot drive a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max attempts for {0} must be at least 1")]
    ZeroAttempts(String),
    #[error("max concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("join timeout must be positive")]
    ZeroJoinTimeout,
}

impl EngineConfig {
    pub fn new(
        default_max_attempts: u32,
        backoff: Backoff,
        join_timeout: Duration,
        max_concurrency: usize,
    ) -> Self {
        Self {
            default_max_attempts,
            max_attempts: BTreeMap::new(),
            backoff,
            join_timeout,
            max_concurrency,
            routing: RoutingConfig {
                research_known_destinations: false,
            },
            confirm_budget_tier: false,
        }
    }

    pub fn with_max_attempts(mut self, class: StepClass, attempts: u32) -> Self {
        self.max_attempts.insert(class, attempts);
        self
    }

    pub fn with_routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_budget_confirmation(mut self, confirm: bool) -> Self {
        self.confirm_budget_tier = confirm;
        self
    }

    /// Attempt budget for `class`.
    pub fn attempts_for(&self, class: StepClass) -> u32 {
        self.max_attempts
            .get(&class)
            .copied()
            .unwrap_or(self.default_max_attempts)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("default".into()));
        }
        if let Some((class, _)) = self.max_attempts.iter().find(|(_, n)| **n == 0) {
            return Err(ConfigError::ZeroAttempts(format!("{:?}", class)));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.join_timeout.is_zero() {
            return Err(ConfigError::ZeroJoinTimeout);
        }
        Ok(())
    }
}
