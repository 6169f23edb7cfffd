use std::path::PathBuf;

use async_trait::async_trait;
use calculator_sdk::{ComputationEntry, SessionKey};

/// Durable per-session history.
///
/// Implementations must keep entries in insertion order and must serialize
/// concurrent `append`/`clear` calls for the same session.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Entries of the session, oldest first.
    ///
    /// Missing or unreadable storage yields an empty list; read failures are
    /// logged, never returned.
    async fn load(&self, session: &SessionKey) -> Vec<ComputationEntry>;

    async fn append(&self, session: &SessionKey, entry: ComputationEntry)
    -> Result<(), StorageError>;

    /// Remove all entries. Clearing a session that has none succeeds.
    async fn clear(&self, session: &SessionKey) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid entry in {path}: {reason}")]
    InvalidEntry { path: PathBuf, reason: String },

    #[error("failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
