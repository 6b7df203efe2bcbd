//! Sync-layer tuning knobs.

use std::path::PathBuf;
use std::time::Duration;

use agentic_client::DEFAULT_PROBE_TTL;

/// Default staleness bound for the read cache.
pub const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(300);

/// Settings for [`PlatformService`](crate::PlatformService).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Age after which cached hierarchy data is refetched
    pub cache_max_age: Duration,

    /// How long a connection probe result is reused
    pub probe_ttl: Duration,

    /// Failed flushes after which a queued update is dead-lettered
    pub max_queue_retries: u32,

    /// Where to persist the offline queue; `None` keeps it in memory only
    pub queue_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            probe_ttl: DEFAULT_PROBE_TTL,
            max_queue_retries: crate::queue::DEFAULT_QUEUE_RETRIES,
            queue_path: None,
        }
    }
}

impl SyncConfig {
    /// Persist the queue at `path`.
    pub fn with_queue_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.queue_path = Some(path.into());
        self
    }

    /// Override the cache staleness bound.
    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.cache_max_age = max_age;
        self
    }

    /// Override the probe TTL.
    pub fn with_probe_ttl(mut self, ttl: Duration) -> Self {
        self.probe_ttl = ttl;
        self
    }
}
