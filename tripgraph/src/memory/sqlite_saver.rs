//! SQLite-backed checkpointer (feature `sqlite`).
//!
//! One row per session; `put` replaces it. Calls run on the blocking pool so the
//! coordinating task is never stalled by disk I/O.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::memory::checkpoint::{cutoff_ms, Checkpoint, CheckpointListItem};
use crate::memory::checkpointer::{CheckpointError, Checkpointer};

/// Persistent checkpointer. Key: session_id.
pub struct SqliteSaver {
    conn: Arc<Mutex<Connection>>,
}

fn storage(e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

impl SqliteSaver {
    /// Opens (or creates) the database at `path` and ensures the schema exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(storage)?;
        }
        let conn = Connection::open(path).map_err(storage)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             CREATE TABLE IF NOT EXISTS checkpoints (
                 session_id TEXT PRIMARY KEY,
                 stage TEXT NOT NULL,
                 created_at_ms INTEGER NOT NULL,
                 payload BLOB NOT NULL
             );
             CREATE INDEX IF NOT EXISTS idx_checkpoints_created
                 ON checkpoints(created_at_ms DESC);",
        )
        .map_err(storage)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, CheckpointError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, CheckpointError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(storage)?;
            f(&guard)
        })
        .await
        .map_err(storage)?
    }
}

#[async_trait]
impl Checkpointer for SqliteSaver {
    async fn put(&self, session_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let payload = checkpoint.encode()?;
        let session_id = session_id.to_string();
        let stage = checkpoint.stage.as_str().to_string();
        let created = checkpoint.metadata.created_at_ms as i64;
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO checkpoints (session_id, stage, created_at_ms, payload)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, stage, created, payload],
            )
            .map_err(storage)?;
            Ok(())
        })
        .await
    }

    async fn get(&self, session_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let session_id = session_id.to_string();
        let payload: Option<Vec<u8>> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT payload FROM checkpoints WHERE session_id = ?1",
                    params![session_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage)
            })
            .await?;
        payload.map(|b| Checkpoint::decode(&b)).transpose()
    }

    async fn list(&self, limit: usize) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let payloads: Vec<Vec<u8>> = self
            .with_conn(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT payload FROM checkpoints
                         ORDER BY created_at_ms DESC, session_id ASC
                         LIMIT ?1",
                    )
                    .map_err(storage)?;
                let rows = stmt
                    .query_map(params![limit as i64], |row| row.get(0))
                    .map_err(storage)?;
                rows.collect::<Result<Vec<Vec<u8>>, _>>().map_err(storage)
            })
            .await?;
        payloads
            .iter()
            .map(|b| Checkpoint::decode(b).map(|cp| cp.list_item()))
            .collect()
    }

    async fn delete(&self, session_id: &str) -> Result<bool, CheckpointError> {
        let session_id = session_id.to_string();
        self.with_conn(move |conn| {
            let n = conn
                .execute(
                    "DELETE FROM checkpoints WHERE session_id = ?1",
                    params![session_id],
                )
                .map_err(storage)?;
            Ok(n > 0)
        })
        .await
    }

    async fn prune_older_than(&self, max_age: Duration) -> Result<usize, CheckpointError> {
        let cutoff = cutoff_ms(max_age) as i64;
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM checkpoints WHERE created_at_ms < ?1",
                params![cutoff],
            )
            .map_err(storage)
        })
        .await
    }
}
