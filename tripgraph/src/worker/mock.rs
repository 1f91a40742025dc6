//! Scripted worker for tests and demos.
//!
//! Returns queued responses in order, then a fixed fallback. Counts calls and can sleep
//! before answering to simulate slow collaborators. No external service required.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Criteria, Worker, WorkerError};

/// Worker whose answers are scripted up front.
///
/// **Interaction**: Implements `Worker`; registered in a `WorkerRegistry` by tests and by
/// the CLI demo wiring.
pub struct ScriptedWorker {
    name: String,
    queued: Mutex<VecDeque<Result<Value, WorkerError>>>,
    fallback: Result<Value, WorkerError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Criteria>>,
}

impl ScriptedWorker {
    /// Always answers `value`.
    pub fn ok(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            queued: Mutex::new(VecDeque::new()),
            fallback: Ok(value),
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with `error`.
    pub fn failing(name: impl Into<String>, error: WorkerError) -> Self {
        Self {
            fallback: Err(error),
            ..Self::ok(name, Value::Null)
        }
    }

    /// Answers these first, in order, before falling back (builder style).
    pub fn then(self, responses: impl IntoIterator<Item = Result<Value, WorkerError>>) -> Self {
        if let Ok(mut q) = self.queued.lock() {
            q.extend(responses);
        }
        self
    }

    /// Sleeps this long before every answer (builder style).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `perform` calls so far, including ones still sleeping.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Criteria of the most recent call.
    pub fn last_criteria(&self) -> Option<Criteria> {
        self.seen.lock().ok().and_then(|seen| seen.last().cloned())
    }
}

#[async_trait]
impl Worker for ScriptedWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn perform(&self, criteria: &Criteria) -> Result<Value, WorkerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(criteria.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.queued.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| self.fallback.clone())
    }
}
