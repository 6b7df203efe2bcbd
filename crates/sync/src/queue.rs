//! Offline write queue.
//!
//! Buffers field-level writes that must eventually reach the platform. The
//! queue holds at most one entry per entity field: a later enqueue for the
//! same field overwrites the value in place. `flush` copies the queue, sends
//! every entry with the lock released, then re-locks to reconcile results
//! against whatever was enqueued in the meantime.
//!
//! An entry that fails `max_retries` flushes leaves the pending queue and is
//! kept on a dead-letter list instead of being discarded.

use agentic_client::{ClientError, PlatformClient};
use agentic_core::{
    EntityKind, QueuedUpdate, SubTaskId, TaskId, TaskStatus, STATUS_FIELD,
};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};

/// Failed flushes before an entry is dead-lettered.
pub const DEFAULT_QUEUE_RETRIES: u32 = 3;

/// Destination for queued status writes.
#[async_trait]
pub trait StatusSink: Send + Sync {
    /// Set a task's status on the platform.
    async fn update_task_status(
        &self,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> std::result::Result<(), ClientError>;

    /// Set a sub-task's status on the platform.
    async fn update_subtask_status(
        &self,
        subtask_id: &SubTaskId,
        status: TaskStatus,
    ) -> std::result::Result<(), ClientError>;
}

#[async_trait]
impl StatusSink for PlatformClient {
    async fn update_task_status(
        &self,
        task_id: &TaskId,
        status: TaskStatus,
    ) -> std::result::Result<(), ClientError> {
        PlatformClient::update_task_status(self, task_id, status).await
    }

    async fn update_subtask_status(
        &self,
        subtask_id: &SubTaskId,
        status: TaskStatus,
    ) -> std::result::Result<(), ClientError> {
        PlatformClient::update_subtask_status(self, subtask_id, status).await
    }
}

/// Outcome of one flush pass.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Entries sent this pass
    pub attempted: usize,

    /// Entries the platform accepted
    pub delivered: usize,

    /// Entries still pending after the pass
    pub remaining: usize,

    /// Entries moved to the dead-letter list this pass
    pub dropped: Vec<QueuedUpdate>,

    /// Last failure seen, if any
    pub last_error: Option<SyncError>,

    /// The pass did not run because another flush was in progress
    pub skipped: bool,
}

impl FlushReport {
    /// True when every attempted entry was delivered.
    pub fn is_clean(&self) -> bool {
        self.last_error.is_none()
    }
}

#[derive(Default)]
struct QueueState {
    pending: Vec<QueuedUpdate>,
    dead_letters: Vec<QueuedUpdate>,
}

/// Deduplicating buffer of pending writes.
pub struct OfflineQueue {
    state: Mutex<QueueState>,
    max_retries: u32,
}

impl Default for OfflineQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_RETRIES)
    }
}

impl OfflineQueue {
    /// Empty queue dead-lettering entries after `max_retries` failures.
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            max_retries: max_retries.max(1),
        }
    }

    /// Add a write, replacing the value of an existing entry for the same field.
    pub async fn enqueue(&self, update: QueuedUpdate) {
        let mut state = self.state.lock().await;
        match state.pending.iter_mut().find(|e| e.same_target(&update)) {
            Some(existing) => {
                debug!(
                    "Coalescing {} {} {}: {} -> {}",
                    update.entity_kind, update.entity_id, update.field, existing.value, update.value
                );
                existing.value = update.value;
                existing.timestamp = update.timestamp;
            }
            None => state.pending.push(update),
        }
    }

    /// Send every pending entry through `sink`.
    ///
    /// Every entry is attempted even after a failure. A failed entry gains a
    /// retry; at the bound it is moved to the dead-letter list. Entries
    /// re-enqueued while the flush was running keep their newer value, and an
    /// overlapping flush counts each failed entry at most once.
    pub async fn flush(&self, sink: &dyn StatusSink) -> FlushReport {
        let snapshot = self.state.lock().await.pending.clone();
        let mut report = FlushReport {
            attempted: snapshot.len(),
            ..FlushReport::default()
        };
        if snapshot.is_empty() {
            return report;
        }

        let mut outcomes = Vec::with_capacity(snapshot.len());
        for update in &snapshot {
            outcomes.push(deliver(sink, update).await);
        }

        let mut state = self.state.lock().await;
        for (sent, outcome) in snapshot.into_iter().zip(outcomes) {
            let position = state.pending.iter().position(|e| e.same_target(&sent));
            // Untouched since the snapshot: not cleared, overwritten, or
            // already settled by an overlapping flush.
            let untouched = position.filter(|&i| {
                let current = &state.pending[i];
                current.value == sent.value
                    && current.timestamp == sent.timestamp
                    && current.retry_count == sent.retry_count
            });

            match outcome {
                Ok(()) => {
                    report.delivered += 1;
                    if let Some(i) = untouched {
                        state.pending.remove(i);
                    }
                }
                Err(err) => {
                    warn!(
                        "Failed to sync {} {} {}={}: {}",
                        sent.entity_kind, sent.entity_id, sent.field, sent.value, err
                    );
                    if let Some(i) = untouched {
                        state.pending[i].retry_count += 1;
                        if state.pending[i].retry_count >= self.max_retries {
                            let dead = state.pending.remove(i);
                            warn!(
                                "Giving up on {} {} {}={} after {} attempts",
                                dead.entity_kind, dead.entity_id, dead.field, dead.value, dead.retry_count
                            );
                            state.dead_letters.push(dead.clone());
                            report.dropped.push(dead);
                        }
                    }
                    report.last_error = Some(err);
                }
            }
        }
        report.remaining = state.pending.len();

        debug!(
            "Flushed {} queued updates: {} delivered, {} remaining, {} dropped",
            report.attempted,
            report.delivered,
            report.remaining,
            report.dropped.len()
        );
        report
    }

    /// Number of pending entries.
    pub async fn count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Discard every pending entry.
    pub async fn clear(&self) {
        self.state.lock().await.pending.clear();
    }

    /// Copy of the pending entries, in queue order.
    pub async fn pending(&self) -> Vec<QueuedUpdate> {
        self.state.lock().await.pending.clone()
    }

    /// Copy of the dead-letter list.
    pub async fn dead_letters(&self) -> Vec<QueuedUpdate> {
        self.state.lock().await.dead_letters.clone()
    }

    /// Number of dead-lettered entries.
    pub async fn dead_letter_count(&self) -> usize {
        self.state.lock().await.dead_letters.len()
    }

    /// Remove and return the dead-letter list.
    pub async fn take_dead_letters(&self) -> Vec<QueuedUpdate> {
        std::mem::take(&mut self.state.lock().await.dead_letters)
    }

    /// Pending and dead-lettered entries, for persistence.
    pub async fn snapshot(&self) -> (Vec<QueuedUpdate>, Vec<QueuedUpdate>) {
        let state = self.state.lock().await;
        (state.pending.clone(), state.dead_letters.clone())
    }

    /// Replace the queue contents with a restored snapshot.
    ///
    /// Duplicate targets in `pending` collapse to the last one.
    pub async fn restore(&self, pending: Vec<QueuedUpdate>, dead_letters: Vec<QueuedUpdate>) {
        let mut state = self.state.lock().await;
        state.pending.clear();
        for update in pending {
            match state.pending.iter_mut().find(|e| e.same_target(&update)) {
                Some(existing) => *existing = update,
                None => state.pending.push(update),
            }
        }
        state.dead_letters = dead_letters;
    }
}

async fn deliver(sink: &dyn StatusSink, update: &QueuedUpdate) -> Result<()> {
    if update.field != STATUS_FIELD {
        return Err(SyncError::UnsupportedField {
            kind: update.entity_kind,
            field: update.field.clone(),
        });
    }

    let status: TaskStatus = update.value.parse()?;
    match update.entity_kind {
        EntityKind::Task => {
            let task_id = TaskId::parse(update.entity_id.as_str())?;
            sink.update_task_status(&task_id, status).await?;
        }
        EntityKind::SubTask => {
            let subtask_id = SubTaskId::parse(update.entity_id.as_str())?;
            sink.update_subtask_status(&subtask_id, status).await?;
        }
    }
    Ok(())
}
