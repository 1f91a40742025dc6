//! Error types shared by steps, the executor and callers.
//!
//! Steps report a [`StepFailure`]; the executor decides whether to retry, degrade or stop.
//! Only failures that make the plan meaningless reach the caller as a [`RunError`].

use thiserror::Error;

use crate::graph::StepId;
use crate::memory::CheckpointError;
use crate::state::ErrorEntry;

/// How the executor should treat a failure. Finer diagnostics stay inside the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Network, timeout, rate limit: worth retrying.
    Transient,
    /// Invalid or unsatisfiable input: retrying cannot help.
    Permanent,
}

/// Failure reported by a step for one attempt.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind:?} failure: {message}")]
pub struct StepFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StepFailure {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// Run-level error returned by `start` / `resume`.
#[derive(Debug, Error)]
pub enum RunError {
    /// A non-degradable step exhausted its attempts, or a step broke slot ownership.
    /// The run is terminal in `ERROR`; the accumulated error log is attached.
    #[error("run {session_id} failed at {step}: {message}")]
    Fatal {
        session_id: String,
        step: StepId,
        message: String,
        error_log: Vec<ErrorEntry>,
    },

    /// The graph cannot route from where the run stands.
    #[error("graph misconfigured: {0}")]
    Misconfigured(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Resume was called for a session that has no checkpoint.
    #[error("no checkpoint for session {0}")]
    NoCheckpoint(String),

    /// Another start/resume is already driving this session.
    #[error("session {0} is already running")]
    SessionBusy(String),
}

impl RunError {
    /// Error log attached to a fatal failure; empty for other variants.
    pub fn error_log(&self) -> &[ErrorEntry] {
        match self {
            RunError::Fatal { error_log, .. } => error_log,
            _ => &[],
        }
    }
}
