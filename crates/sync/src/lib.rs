//! Synchronization between local agent sessions and the Agentic platform.
//!
//! - [`ReadCache`]: last-known project hierarchy with coarse staleness
//! - [`OfflineQueue`]: coalesced status writes that survive outages
//! - [`StatusSyncer`]: maps session lifecycle onto task status and flushes
//! - [`PlatformService`]: the facade UI and session code talk to

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod error;
pub mod queue;
pub mod service;
pub mod syncer;

pub use cache::ReadCache;
pub use config::{SyncConfig, DEFAULT_CACHE_MAX_AGE};
pub use error::{Result, SyncError};
pub use queue::{FlushReport, OfflineQueue, StatusSink, DEFAULT_QUEUE_RETRIES};
pub use service::PlatformService;
pub use syncer::StatusSyncer;
