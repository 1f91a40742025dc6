//! Logging utilities for graph execution.
//!
//! Structured events for step execution, retries, the parallel join, checkpoints and
//! interrupts. Uses `tracing` when the feature is on and falls back to stderr otherwise.

use std::time::Duration;

use crate::graph::{Branch, StepId};
use crate::state::Stage;

/// Log step execution start.
pub fn log_step_start(session_id: &str, step: StepId) {
    #[cfg(feature = "tracing")]
    tracing::debug!(session_id, step = step.as_str(), "Starting step");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] {} starting step {}", session_id, step);
}

/// Log a stage transition after a step completed or degraded.
pub fn log_stage_transition(session_id: &str, from: Stage, to: Stage) {
    #[cfg(feature = "tracing")]
    tracing::debug!(session_id, from = from.as_str(), to = to.as_str(), "Stage transition");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] {} stage {} -> {}", session_id, from, to);
}

/// Log a failed attempt that will be retried after `delay`.
pub fn log_retry(
    session_id: &str,
    step: StepId,
    attempt: u32,
    max_attempts: u32,
    delay: Duration,
    message: &str,
) {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        session_id,
        step = step.as_str(),
        attempt,
        max_attempts,
        delay_ms = delay.as_millis() as u64,
        message,
        "Step attempt failed, retrying"
    );

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[WARN] {} step {} attempt {}/{} failed: {} (retry in {:?})",
        session_id, step, attempt, max_attempts, message, delay
    );
}

/// Log a step whose slot was marked degraded.
pub fn log_degraded(session_id: &str, step: StepId, reason: &str) {
    #[cfg(feature = "tracing")]
    tracing::warn!(session_id, step = step.as_str(), reason, "Step degraded");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[WARN] {} step {} degraded: {}", session_id, step, reason);
}

/// Log the parallel phase starting with `pending` branches.
pub fn log_join_start(session_id: &str, pending: &[Branch]) {
    #[cfg(feature = "tracing")]
    tracing::info!(session_id, ?pending, "Parallel search started");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] {} parallel search started: {:?}", session_id, pending);
}

/// Log branches cut off by the join deadline.
pub fn log_join_timeout(session_id: &str, timed_out: &[Branch], timeout: Duration) {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        session_id,
        ?timed_out,
        timeout_ms = timeout.as_millis() as u64,
        "Join timeout, cancelling branches"
    );

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[WARN] {} join timeout after {:?}: {:?}",
        session_id, timeout, timed_out
    );
}

/// Log a checkpoint write.
pub fn log_checkpoint(session_id: &str, stage: Stage) {
    #[cfg(feature = "tracing")]
    tracing::debug!(session_id, stage = stage.as_str(), "Checkpoint saved");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[DEBUG] {} checkpoint at {}", session_id, stage);
}

/// Log a checkpoint write that failed while the run was already failing.
pub fn log_checkpoint_failed(session_id: &str, error: &str) {
    #[cfg(feature = "tracing")]
    tracing::error!(session_id, error, "Checkpoint write failed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] {} checkpoint write failed: {}", session_id, error);
}

/// Log a checkpoint written by a newer schema version.
pub fn log_checkpoint_version_ahead(session_id: &str, found: u32, supported: u32) {
    #[cfg(feature = "tracing")]
    tracing::warn!(session_id, found, supported, "Checkpoint from newer version");

    #[cfg(not(feature = "tracing"))]
    eprintln!(
        "[WARN] {} checkpoint version {} is newer than {}",
        session_id, found, supported
    );
}

/// Log a run suspended for external input.
pub fn log_interrupt(session_id: &str, step: StepId, prompt: &str) {
    #[cfg(feature = "tracing")]
    tracing::info!(session_id, step = step.as_str(), prompt, "Run suspended");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] {} suspended at {}: {}", session_id, step, prompt);
}

/// Log run start (or resume).
pub fn log_run_start(session_id: &str, resumed: bool) {
    #[cfg(feature = "tracing")]
    tracing::info!(session_id, resumed, "Starting planning run");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] {} starting run (resumed: {})", session_id, resumed);
}

/// Log run completion.
pub fn log_run_complete(session_id: &str, failures: usize) {
    #[cfg(feature = "tracing")]
    tracing::info!(session_id, failures, "Planning run complete");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[INFO] {} run complete ({} failures)", session_id, failures);
}

/// Log a fatal run error.
pub fn log_run_error(session_id: &str, step: StepId, message: &str) {
    #[cfg(feature = "tracing")]
    tracing::error!(session_id, step = step.as_str(), message, "Planning run failed");

    #[cfg(not(feature = "tracing"))]
    eprintln!("[ERROR] {} run failed at {}: {}", session_id, step, message);
}
