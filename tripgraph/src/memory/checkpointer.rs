//! Checkpointer trait and checkpoint errors.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::checkpoint::{cutoff_ms, Checkpoint, CheckpointListItem};

/// Error from checkpoint encoding or storage.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint serialization failed: {0}")]
    Serialization(String),
    #[error("checkpoint storage failed: {0}")]
    Storage(String),
}

/// Durable session id → latest checkpoint store.
///
/// Resume assumes the most recent `put` for a session is visible to the next `get`, and
/// that there is at most one writer per session.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Stores `checkpoint` as the latest for `session_id`, replacing the previous one.
    async fn put(&self, session_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;

    /// Latest checkpoint for `session_id`, or `None`.
    async fn get(&self, session_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Most recent checkpoints across sessions, newest first.
    async fn list(&self, limit: usize) -> Result<Vec<CheckpointListItem>, CheckpointError>;

    /// Removes the session's checkpoint. Returns whether one existed.
    async fn delete(&self, session_id: &str) -> Result<bool, CheckpointError>;

    /// Removes every session whose latest checkpoint is older than `max_age`. Returns how
    /// many were removed.
    async fn prune_older_than(&self, max_age: Duration) -> Result<usize, CheckpointError> {
        let cutoff = cutoff_ms(max_age);
        let mut removed = 0;
        for item in self.list(usize::MAX).await? {
            if item.metadata.created_at_ms < cutoff && self.delete(&item.session_id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
