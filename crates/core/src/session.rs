//! Local session lifecycle and its mapping onto remote task status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::task::TaskStatus;
use crate::ValidationError;

/// Lifecycle state of a local agent session working on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session created
    Started,
    /// Agent actively working
    Running,
    /// Agent waiting for input
    Idle,
    /// Session failed
    Error,
    /// Session finished its work
    Completed,
    /// Session stopped by the user
    Stopped,
}

impl SessionState {
    /// Every session state.
    pub const ALL: [SessionState; 6] = [
        SessionState::Started,
        SessionState::Running,
        SessionState::Idle,
        SessionState::Error,
        SessionState::Completed,
        SessionState::Stopped,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Started => "started",
            SessionState::Running => "running",
            SessionState::Idle => "idle",
            SessionState::Error => "error",
            SessionState::Completed => "completed",
            SessionState::Stopped => "stopped",
        }
    }

    /// Remote status to push when a session enters this state.
    ///
    /// `Completed` and `Stopped` push nothing: completion is marked
    /// explicitly by the user on the platform.
    pub fn remote_status(&self) -> Option<TaskStatus> {
        match self {
            SessionState::Started | SessionState::Running => Some(TaskStatus::Processing),
            SessionState::Idle => Some(TaskStatus::Pending),
            SessionState::Error => Some(TaskStatus::Error),
            SessionState::Completed | SessionState::Stopped => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownSessionState(s.to_string()))
    }
}

/// True iff both statuses are known and they disagree.
///
/// Callers use this to decide whether to ask the user before overwriting the
/// remote value with the local one.
pub fn detect_status_conflict(local: &str, remote: &str) -> bool {
    !local.is_empty() && !remote.is_empty() && local != remote
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_mapping() {
        assert_eq!(SessionState::Started.remote_status(), Some(TaskStatus::Processing));
        assert_eq!(SessionState::Running.remote_status(), Some(TaskStatus::Processing));
        assert_eq!(SessionState::Idle.remote_status(), Some(TaskStatus::Pending));
        assert_eq!(SessionState::Error.remote_status(), Some(TaskStatus::Error));
        assert_eq!(SessionState::Completed.remote_status(), None);
        assert_eq!(SessionState::Stopped.remote_status(), None);
    }

    #[test]
    fn test_parse_session_state() {
        assert_eq!("idle".parse::<SessionState>().unwrap(), SessionState::Idle);
        assert!("paused".parse::<SessionState>().is_err());
    }

    #[test]
    fn test_detect_status_conflict() {
        assert!(detect_status_conflict("processing", "pending"));
        assert!(!detect_status_conflict("processing", "processing"));
        assert!(!detect_status_conflict("", "pending"));
        assert!(!detect_status_conflict("processing", ""));
        assert!(!detect_status_conflict("", ""));
    }
}
