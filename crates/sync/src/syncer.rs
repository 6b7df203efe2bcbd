//! Status syncer: bridges local session lifecycle to remote task status.
//!
//! Local transitions are mapped to a [`TaskStatus`] and coalesced in an
//! [`OfflineQueue`], one pending status per task. `flush_updates` pushes them
//! through a [`StatusSink`] and records the outcome as sync health that UI
//! code can poll through [`StatusSyncer::sync_status`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agentic_core::{
    detect_status_conflict, QueuedUpdate, SessionState, SubTaskId, SyncStatus, TaskId,
    TaskStatus, Time, ValidationError,
};
use agentic_storage::{QueueSnapshot, QueueStore};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::queue::{FlushReport, OfflineQueue, StatusSink};

#[derive(Default)]
struct SyncFlags {
    last_sync: Option<Time>,
    is_offline: bool,
    last_error: Option<String>,
}

/// Clears the syncing flag when the flush ends, including when its future is
/// dropped mid-flight.
struct SyncingGuard<'a>(&'a AtomicBool);

impl<'a> SyncingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Pushes local status changes to the platform and tracks sync health.
pub struct StatusSyncer {
    queue: OfflineQueue,
    sink: Arc<dyn StatusSink>,
    store: Option<Arc<dyn QueueStore>>,
    syncing: AtomicBool,
    flags: Mutex<SyncFlags>,
}

impl StatusSyncer {
    /// Syncer delivering through `sink`, dead-lettering after `max_retries`.
    pub fn new(sink: Arc<dyn StatusSink>, max_retries: u32) -> Self {
        Self {
            queue: OfflineQueue::new(max_retries),
            sink,
            store: None,
            syncing: AtomicBool::new(false),
            flags: Mutex::new(SyncFlags::default()),
        }
    }

    /// Persist the queue in `store`, restoring whatever it already holds.
    pub async fn with_store(mut self, store: Arc<dyn QueueStore>) -> Result<Self> {
        if let Some(snapshot) = store.load().await? {
            info!(
                "Restored {} pending status updates ({} dead letters)",
                snapshot.pending.len(),
                snapshot.dead_letters.len()
            );
            self.queue
                .restore(snapshot.pending, snapshot.dead_letters)
                .await;
        }
        self.store = Some(store);
        Ok(self)
    }

    async fn persist(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let (pending, dead_letters) = self.queue.snapshot().await;
        // Nothing left to remember: drop the snapshot entirely.
        if pending.is_empty() && dead_letters.is_empty() {
            store.clear().await?;
        } else {
            store.save(&QueueSnapshot::new(pending, dead_letters)).await?;
        }
        Ok(())
    }

    /// Queue a status for a task, replacing any pending status for it.
    ///
    /// Both arguments must be non-empty and `status` must be a valid
    /// [`TaskStatus`]; nothing is queued otherwise.
    pub async fn push_status_update(&self, task_id: &str, status: &str) -> Result<()> {
        let task_id = TaskId::parse(task_id)?;
        if status.is_empty() {
            return Err(ValidationError::UnknownStatus(String::new()).into());
        }
        let status: TaskStatus = status.parse()?;

        self.queue
            .enqueue(QueuedUpdate::task_status(&task_id, status))
            .await;
        debug!("Queued status {} for task {}", status, task_id);
        self.persist().await
    }

    /// Queue a status for a sub-task.
    pub async fn push_subtask_status(&self, subtask_id: &SubTaskId, status: TaskStatus) -> Result<()> {
        self.queue
            .enqueue(QueuedUpdate::subtask_status(subtask_id, status))
            .await;
        debug!("Queued status {} for subtask {}", status, subtask_id);
        self.persist().await
    }

    /// Record a local session transition.
    ///
    /// Returns the status queued for the task, or `None` when the state maps
    /// to no remote change (`completed`, `stopped`).
    pub async fn report_session_state(
        &self,
        task_id: &TaskId,
        state: SessionState,
    ) -> Result<Option<TaskStatus>> {
        let Some(status) = state.remote_status() else {
            debug!("Session state {} for task {} is not pushed", state, task_id);
            return Ok(None);
        };
        self.push_status_update(task_id.as_str(), status.as_str())
            .await?;
        Ok(Some(status))
    }

    /// Send every pending update.
    ///
    /// Failed entries stay pending (until they exhaust their retries) and the
    /// syncer goes offline; a fully successful pass brings it back online. If
    /// another flush is already running this returns a skipped report without
    /// touching the network. Dropping the returned future abandons the pass;
    /// the queue keeps every entry and the next call runs normally.
    pub async fn flush_updates(&self) -> Result<FlushReport> {
        let Some(_syncing) = SyncingGuard::acquire(&self.syncing) else {
            debug!("Flush already in progress, skipping");
            return Ok(FlushReport {
                skipped: true,
                ..FlushReport::default()
            });
        };

        let mut report = self.queue.flush(self.sink.as_ref()).await;
        let persisted = self.persist().await;

        let mut flags = self.flags.lock().await;
        flags.last_sync = Some(Utc::now());

        match report.last_error.take() {
            Some(err) => {
                if let Err(store_err) = &persisted {
                    warn!("Failed to persist queue after flush: {}", store_err);
                }
                if !flags.is_offline {
                    info!("Status sync failed, marking offline: {}", err);
                }
                flags.is_offline = true;
                flags.last_error = Some(err.to_string());
                Err(err)
            }
            None => {
                if flags.is_offline {
                    info!("Status sync recovered, back online");
                }
                flags.is_offline = false;
                flags.last_error = None;
                persisted?;
                Ok(report)
            }
        }
    }

    /// Consistent view of sync health.
    pub async fn sync_status(&self) -> SyncStatus {
        let flags = self.flags.lock().await;
        SyncStatus {
            last_sync_time: flags.last_sync,
            is_syncing: self.syncing.load(Ordering::Acquire),
            pending_updates: self.queue.count().await,
            last_error: flags.last_error.clone(),
            is_offline: flags.is_offline,
            dead_letters: self.queue.dead_letter_count().await,
        }
    }

    /// True iff both statuses are set and differ.
    pub fn detect_status_conflict(local: &str, remote: &str) -> bool {
        detect_status_conflict(local, remote)
    }

    /// Force offline, e.g. when a connection probe fails.
    pub async fn mark_offline(&self) {
        let mut flags = self.flags.lock().await;
        if !flags.is_offline {
            info!("Marked offline");
        }
        flags.is_offline = true;
    }

    /// Force online, e.g. when a connection probe succeeds.
    pub async fn mark_online(&self) {
        let mut flags = self.flags.lock().await;
        if flags.is_offline {
            info!("Marked online");
        }
        flags.is_offline = false;
    }

    /// Number of pending updates.
    pub async fn pending_count(&self) -> usize {
        self.queue.count().await
    }

    /// Pending updates, in queue order.
    pub async fn pending_updates(&self) -> Vec<QueuedUpdate> {
        self.queue.pending().await
    }

    /// Updates dropped after exhausting their retries.
    pub async fn dead_letters(&self) -> Vec<QueuedUpdate> {
        self.queue.dead_letters().await
    }

    /// Discard every pending update.
    pub async fn clear_pending(&self) -> Result<()> {
        self.queue.clear().await;
        self.persist().await
    }

    /// Remove and return the dead letters.
    pub async fn discard_dead_letters(&self) -> Result<Vec<QueuedUpdate>> {
        let dropped = self.queue.take_dead_letters().await;
        self.persist().await?;
        Ok(dropped)
    }
}
