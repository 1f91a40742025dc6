//! In-memory checkpointer (MemorySaver).
//!
//! Keeps the encoded bytes per session, so reads go through the same decode path as a
//! persistent store. Not persistent; for dev and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::checkpoint::{cutoff_ms, Checkpoint, CheckpointListItem};
use crate::memory::checkpointer::{CheckpointError, Checkpointer};

/// In-memory checkpointer. Key: session_id. Latest checkpoint wins.
#[derive(Default)]
pub struct MemorySaver {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw bytes as the session's checkpoint. Lets tests plant legacy payloads.
    pub async fn put_raw(&self, session_id: &str, bytes: Vec<u8>) {
        self.inner.write().await.insert(session_id.to_string(), bytes);
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(&self, session_id: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let bytes = checkpoint.encode()?;
        self.inner.write().await.insert(session_id.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let guard = self.inner.read().await;
        guard.get(session_id).map(|b| Checkpoint::decode(b)).transpose()
    }

    async fn list(&self, limit: usize) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let guard = self.inner.read().await;
        let mut items = guard
            .values()
            .map(|b| Checkpoint::decode(b).map(|cp| cp.list_item()))
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by(|a, b| {
            b.metadata
                .created_at_ms
                .cmp(&a.metadata.created_at_ms)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        items.truncate(limit);
        Ok(items)
    }

    async fn delete(&self, session_id: &str) -> Result<bool, CheckpointError> {
        Ok(self.inner.write().await.remove(session_id).is_some())
    }

    async fn prune_older_than(&self, max_age: Duration) -> Result<usize, CheckpointError> {
        let cutoff = cutoff_ms(max_age);
        let mut guard = self.inner.write().await;
        let before = guard.len();
        // Payloads that no longer decode are kept; `delete` still removes them.
        guard.retain(|_, bytes| match Checkpoint::decode(bytes) {
            Ok(cp) => cp.metadata.created_at_ms >= cutoff,
            Err(_) => true,
        });
        Ok(before - guard.len())
    }
}
