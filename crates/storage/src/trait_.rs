//! Queue store trait abstraction.

use agentic_core::{QueuedUpdate, Time};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot written by an unknown format version
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
}

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Persisted state of the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Snapshot format version
    pub version: u32,

    /// When the snapshot was taken
    pub updated_at: Time,

    /// Updates still waiting for delivery, in queue order
    pub pending: Vec<QueuedUpdate>,

    /// Updates dropped after exhausting their retries
    #[serde(default)]
    pub dead_letters: Vec<QueuedUpdate>,
}

impl QueueSnapshot {
    /// Snapshot of the given queue contents, stamped now.
    pub fn new(pending: Vec<QueuedUpdate>, dead_letters: Vec<QueuedUpdate>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            updated_at: chrono::Utc::now(),
            pending,
            dead_letters,
        }
    }
}

impl Default for QueueSnapshot {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// Storage abstraction for queue snapshots.
///
/// This trait allows different storage backends to be plugged in.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Load the last saved snapshot, if any.
    async fn load(&self) -> Result<Option<QueueSnapshot>>;

    /// Replace the saved snapshot.
    async fn save(&self, snapshot: &QueueSnapshot) -> Result<()>;

    /// Remove the saved snapshot.
    async fn clear(&self) -> Result<()>;
}

/// Store that keeps the snapshot in memory.
#[derive(Default)]
pub struct MemoryQueueStore {
    snapshot: Mutex<Option<QueueSnapshot>>,
}

impl MemoryQueueStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn load(&self) -> Result<Option<QueueSnapshot>> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        *self.snapshot.lock().await = Some(snapshot.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.snapshot.lock().await = None;
        Ok(())
    }
}
