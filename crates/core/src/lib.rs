//! Agentic platform data models.
//!
//! This crate defines the entity hierarchy mirrored from the remote
//! task-tracking platform, the status vocabulary shared with it, and the
//! records the sync layer keeps about pending writes and connectivity.

#![warn(missing_docs)]

// Core identities
mod id;
mod error;

// Hierarchy
mod project;
mod task;

// Lifecycle and sync
mod session;
mod sync;
mod api_key;

// Re-exports
pub use id::*;
pub use error::ValidationError;

pub use project::{Project, Product, Spec, User};
pub use task::{Task, SubTask, TaskStatus};

pub use session::{SessionState, detect_status_conflict};
pub use sync::{QueuedUpdate, EntityKind, ConnectionStatus, SyncStatus, STATUS_FIELD};
pub use api_key::{
    validate_api_key_format, mask_api_key, API_KEY_PREFIXES, API_KEY_MIN_SUFFIX,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
