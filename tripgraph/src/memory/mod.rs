//! # Memory: checkpoints for resumable runs
//!
//! At every stage boundary the executor captures a [`Checkpoint`] and hands it to a
//! [`Checkpointer`] keyed by session id. `resume` reads the latest one back and continues
//! from the recorded stage.
//!
//! ## Checkpointer implementations
//!
//! | Type            | Persistence | Use case                | Feature  |
//! |-----------------|-------------|-------------------------|----------|
//! | [`MemorySaver`] | In-memory   | Dev, tests              | —        |
//! | `SqliteSaver`   | SQLite file | Single-node, production | `sqlite` |
//!
//! Both stores keep the JSON bytes produced by [`JsonSerializer`], so every `get` goes
//! through the same decode path as a checkpoint written by an older build.
//!
//! ## Versioning
//!
//! [`CHECKPOINT_VERSION`] is written into every checkpoint. Decoding ignores unknown fields
//! and defaults missing ones to absent; a version newer than this build logs a warning and
//! still decodes.
//!
//! ## Housekeeping
//!
//! `list`, `delete` and `prune_older_than` keep the store bounded. Pruning goes by the
//! creation time of each session's latest checkpoint.

mod checkpoint;
mod checkpointer;
mod memory_saver;
mod serializer;
#[cfg(feature = "sqlite")]
mod sqlite_saver;

pub use checkpoint::{
    Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource, CHECKPOINT_VERSION,
};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};
#[cfg(feature = "sqlite")]
pub use sqlite_saver::SqliteSaver;
