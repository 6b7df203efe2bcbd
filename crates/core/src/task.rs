//! Task model - the leaf work item on the platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::id::{SpecId, SubTaskId, TaskId};
use crate::ValidationError;

/// A task belongs to a spec and carries the status the sync layer pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Owning spec
    pub spec_id: SpecId,

    /// Task title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Current status
    pub status: TaskStatus,

    /// Whether the task pauses at checkpoints for review
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_mode: Option<bool>,
}

/// A sub-task belongs to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    /// Unique identifier
    pub id: SubTaskId,

    /// Parent task
    pub task_id: TaskId,

    /// Sub-task title
    pub title: String,

    /// Free-form content
    #[serde(default)]
    pub content: String,

    /// Current status
    pub status: TaskStatus,
}

/// Remote task status. Any status sent to the platform must be one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Planned but not queued
    Planned,
    /// Waiting to be picked up
    Pending,
    /// Environment being prepared
    Initializing,
    /// Work in progress
    Processing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Error,
    /// Exceeded its time budget
    TimedOut,
    /// Stopped by a user
    Stopped,
    /// Blocked on human feedback
    AwaitingFeedback,
}

impl TaskStatus {
    /// Every valid status, in lifecycle order.
    pub const ALL: [TaskStatus; 9] = [
        TaskStatus::Planned,
        TaskStatus::Pending,
        TaskStatus::Initializing,
        TaskStatus::Processing,
        TaskStatus::Completed,
        TaskStatus::Error,
        TaskStatus::TimedOut,
        TaskStatus::Stopped,
        TaskStatus::AwaitingFeedback,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Planned => "planned",
            TaskStatus::Pending => "pending",
            TaskStatus::Initializing => "initializing",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
            TaskStatus::TimedOut => "timed_out",
            TaskStatus::Stopped => "stopped",
            TaskStatus::AwaitingFeedback => "awaiting_feedback",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert_eq!(
            "done".parse::<TaskStatus>(),
            Err(ValidationError::UnknownStatus("done".to_string()))
        );
        assert!("Processing".parse::<TaskStatus>().is_err());
        assert!("".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_deserializes_without_optional_fields() {
        let task: Task = serde_json::from_str(
            r#"{"id":"t1","spec_id":"s1","title":"Wire up","status":"awaiting_feedback"}"#,
        )
        .unwrap();
        assert_eq!(task.status, TaskStatus::AwaitingFeedback);
        assert_eq!(task.checkpoint_mode, None);
        assert!(task.description.is_empty());
    }

    #[test]
    fn test_unknown_status_fails_deserialization() {
        let result: Result<Task, _> = serde_json::from_str(
            r#"{"id":"t1","spec_id":"s1","title":"x","status":"archived"}"#,
        );
        assert!(result.is_err());
    }
}
