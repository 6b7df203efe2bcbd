//! JSON file queue store.
//!
//! Keeps the queue snapshot in a single pretty-printed JSON file. Writes go
//! to a sibling temp file first and are renamed into place, so a crash
//! mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::trait_::{QueueSnapshot, QueueStore, Result, StorageError, SNAPSHOT_VERSION};

/// File-based JSON queue store.
pub struct JsonQueueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonQueueStore {
    /// Store backed by `path`. Parent directories are created on first save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl QueueStore for JsonQueueStore {
    async fn load(&self) -> Result<Option<QueueSnapshot>> {
        match fs::read_to_string(&self.path).await {
            Ok(json) => {
                let snapshot: QueueSnapshot = serde_json::from_str(&json)?;
                if snapshot.version > SNAPSHOT_VERSION {
                    return Err(StorageError::UnsupportedVersion(snapshot.version));
                }
                debug!(
                    "Loaded queue snapshot from {} ({} pending)",
                    self.path.display(),
                    snapshot.pending.len()
                );
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_core::{QueuedUpdate, TaskId, TaskStatus};

    fn update(task: &str, status: TaskStatus) -> QueuedUpdate {
        QueuedUpdate::task_status(&TaskId::parse(task).unwrap(), status)
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonQueueStore::new(dir.path().join("queue.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonQueueStore::new(dir.path().join("nested").join("queue.json"));

        let mut retried = update("t2", TaskStatus::Pending);
        retried.retry_count = 2;
        let snapshot = QueueSnapshot::new(
            vec![update("t1", TaskStatus::Processing), retried],
            vec![update("t3", TaskStatus::Error)],
        );
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonQueueStore::new(dir.path().join("queue.json"));
        store.save(&QueueSnapshot::default()).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        // clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_newer_snapshot_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        let mut snapshot = QueueSnapshot::default();
        snapshot.version = SNAPSHOT_VERSION + 1;
        std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let err = JsonQueueStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedVersion(_)));
    }
}
