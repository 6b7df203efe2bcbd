//! Errors returned by the sync layer.

use agentic_client::ClientError;
use agentic_core::{EntityKind, ValidationError};
use agentic_storage::StorageError;

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while syncing with the platform.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Input rejected locally
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Queued write for a field the queue cannot deliver
    #[error("unsupported field {field:?} on {kind}")]
    UnsupportedField {
        /// Target entity kind
        kind: EntityKind,
        /// Field name
        field: String,
    },

    /// Platform call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Read-path fetch failed with no usable cached copy
    #[error("failed to get {what}: {source}")]
    Fetch {
        /// What was being fetched
        what: &'static str,
        /// Underlying client error
        source: ClientError,
    },

    /// Platform unreachable and nothing cached
    #[error("platform is offline and no cached {0} are available")]
    Offline(&'static str),

    /// Queue snapshot could not be read or written
    #[error("queue storage error: {0}")]
    Storage(#[from] StorageError),
}
