//! Worker registry: lazily builds and caches one worker per kind.
//!
//! Constructed once per process and shared by reference. Each registered kind gets its own
//! `OnceCell`, created up front, so steady-state lookups are lock-free reads and concurrent
//! first use still runs the factory at most once.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{Worker, WorkerError, WorkerKind};

/// Builds a worker on first use (client setup, sessions, ...).
#[async_trait]
pub trait WorkerFactory: Send + Sync {
    async fn create(&self) -> Result<Arc<dyn Worker>, WorkerError>;
}

type CreateFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn Worker>, WorkerError>> + Send>>;

struct FnFactory<F>(F);

#[async_trait]
impl<F> WorkerFactory for FnFactory<F>
where
    F: Fn() -> CreateFuture + Send + Sync,
{
    async fn create(&self) -> Result<Arc<dyn Worker>, WorkerError> {
        (self.0)().await
    }
}

struct Entry {
    factory: Arc<dyn WorkerFactory>,
    cell: OnceCell<Arc<dyn Worker>>,
}

/// Process-wide cache of workers, one per [`WorkerKind`].
#[derive(Default)]
pub struct WorkerRegistry {
    entries: HashMap<WorkerKind, Entry>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for `kind`. Replaces any earlier registration.
    pub fn register(&mut self, kind: WorkerKind, factory: Arc<dyn WorkerFactory>) -> &mut Self {
        self.entries.insert(
            kind,
            Entry {
                factory,
                cell: OnceCell::new(),
            },
        );
        self
    }

    /// Registers an async closure as the factory for `kind`.
    pub fn register_fn<F, Fut>(&mut self, kind: WorkerKind, f: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn Worker>, WorkerError>> + Send + 'static,
    {
        let factory = FnFactory(move || -> CreateFuture { Box::pin(f()) });
        self.register(kind, Arc::new(factory))
    }

    /// Registers an already-built worker; `get` returns it as-is.
    pub fn register_instance(&mut self, kind: WorkerKind, worker: Arc<dyn Worker>) -> &mut Self {
        let cell = OnceCell::new_with(Some(worker.clone()));
        self.entries.insert(
            kind,
            Entry {
                factory: Arc::new(FnFactory(move || -> CreateFuture {
                    let w = worker.clone();
                    Box::pin(async move { Ok(w) })
                })),
                cell,
            },
        );
        self
    }

    pub fn is_registered(&self, kind: WorkerKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Returns the worker for `kind`, building it on first call.
    ///
    /// A failed construction is not cached; the next call tries again.
    pub async fn get(&self, kind: WorkerKind) -> Result<Arc<dyn Worker>, WorkerError> {
        let entry = self.entries.get(&kind).ok_or_else(|| {
            WorkerError::Permanent(format!("no worker registered for {:?}", kind))
        })?;
        if let Some(worker) = entry.cell.get() {
            return Ok(worker.clone());
        }
        let worker = entry
            .cell
            .get_or_try_init(|| entry.factory.create())
            .await?;
        Ok(worker.clone())
    }
}
