//! Sync-layer records: queued writes and health snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{SubTaskId, TaskId};
use crate::project::User;
use crate::task::TaskStatus;
use crate::Time;

/// Field name used for status writes.
pub const STATUS_FIELD: &str = "status";

/// Kind of entity a queued write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A task
    Task,
    /// A sub-task
    SubTask,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Task => write!(f, "task"),
            EntityKind::SubTask => write!(f, "subtask"),
        }
    }
}

/// A field-level write waiting to reach the platform.
///
/// At most one update exists per `(kind, entity_id, field)`; newer writes
/// replace the value in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedUpdate {
    /// Kind of the target entity
    pub entity_kind: EntityKind,

    /// Target entity id
    pub entity_id: String,

    /// Field being written
    pub field: String,

    /// New value, in wire form
    pub value: String,

    /// When the value was last enqueued
    pub timestamp: Time,

    /// Failed delivery attempts so far
    pub retry_count: u32,
}

impl QueuedUpdate {
    /// Create a fresh update with no retries.
    pub fn new(
        entity_kind: EntityKind,
        entity_id: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            entity_kind,
            entity_id: entity_id.into(),
            field: field.into(),
            value: value.into(),
            timestamp: chrono::Utc::now(),
            retry_count: 0,
        }
    }

    /// Status write for a task.
    pub fn task_status(task_id: &TaskId, status: TaskStatus) -> Self {
        Self::new(EntityKind::Task, task_id.as_str(), STATUS_FIELD, status.as_str())
    }

    /// Status write for a sub-task.
    pub fn subtask_status(subtask_id: &SubTaskId, status: TaskStatus) -> Self {
        Self::new(
            EntityKind::SubTask,
            subtask_id.as_str(),
            STATUS_FIELD,
            status.as_str(),
        )
    }

    /// True when both updates target the same entity field.
    pub fn same_target(&self, other: &QueuedUpdate) -> bool {
        self.entity_kind == other.entity_kind
            && self.entity_id == other.entity_id
            && self.field == other.field
    }
}

/// Reachability of the platform as last probed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Last probe succeeded
    pub connected: bool,

    /// Last probe failed; callers should serve cached data
    pub offline_mode: bool,

    /// Platform base URL probed
    pub base_url: String,

    /// Account behind the API key, when known
    pub user: Option<User>,

    /// Error text from the last failed probe
    pub error: Option<String>,

    /// When the probe last ran; `None` forces the next check to probe
    pub last_checked: Option<Time>,
}

impl ConnectionStatus {
    /// Status before any probe has run.
    pub fn unchecked(base_url: impl Into<String>) -> Self {
        Self {
            connected: false,
            offline_mode: false,
            base_url: base_url.into(),
            user: None,
            error: None,
            last_checked: None,
        }
    }
}

/// Read-only view of the status syncer's health.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// End of the last flush attempt
    pub last_sync_time: Option<Time>,

    /// A flush is in progress
    pub is_syncing: bool,

    /// Updates waiting for delivery
    pub pending_updates: usize,

    /// Error from the last failed flush
    pub last_error: Option<String>,

    /// The last flush could not reach the platform
    pub is_offline: bool,

    /// Updates dropped after exhausting their retries
    pub dead_letters: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_target_ignores_value() {
        let task = TaskId::parse("task1").unwrap();
        let a = QueuedUpdate::task_status(&task, TaskStatus::Processing);
        let b = QueuedUpdate::task_status(&task, TaskStatus::Pending);
        assert!(a.same_target(&b));

        let sub = SubTaskId::parse("task1").unwrap();
        let c = QueuedUpdate::subtask_status(&sub, TaskStatus::Pending);
        assert!(!a.same_target(&c));
    }
}
