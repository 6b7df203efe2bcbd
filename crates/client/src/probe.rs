//! Connection probe with a TTL-cached status.
//!
//! One probe instance is built per client configuration and shared (via
//! `Arc`) by every caller that needs to know whether the platform is
//! reachable. Within the TTL callers see the cached status without a network
//! round-trip; the first caller after expiry re-probes while holding the write
//! lock, so concurrent callers wait for the fresh value rather than probing
//! again. The signed-in user is looked up after the status is published, with
//! the lock released.

use std::time::Duration;

use agentic_core::{ConnectionStatus, User};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{DataEnvelope, ME_PATH};
use crate::transport::PlatformClient;

/// How long a probe result is reused.
pub const DEFAULT_PROBE_TTL: Duration = Duration::from_secs(30);

/// Shared, throttled reachability check.
pub struct ConnectionProbe {
    client: PlatformClient,
    ttl: Duration,
    status: RwLock<ConnectionStatus>,
}

impl ConnectionProbe {
    /// Probe with the default 30s TTL.
    pub fn new(client: PlatformClient) -> Self {
        Self::with_ttl(client, DEFAULT_PROBE_TTL)
    }

    /// Probe with a custom TTL.
    pub fn with_ttl(client: PlatformClient, ttl: Duration) -> Self {
        let status = ConnectionStatus::unchecked(client.base_url());
        Self {
            client,
            ttl,
            status: RwLock::new(status),
        }
    }

    fn is_fresh(&self, status: &ConnectionStatus) -> bool {
        status.last_checked.is_some_and(|checked| {
            (Utc::now() - checked)
                .to_std()
                .map(|age| age < self.ttl)
                .unwrap_or(false)
        })
    }

    /// Cached status if within the TTL, otherwise a fresh probe.
    pub async fn check_connection(&self) -> ConnectionStatus {
        {
            let status = self.status.read().await;
            if self.is_fresh(&status) {
                return status.clone();
            }
        }

        let mut status = self.status.write().await;
        // Another caller may have probed while we waited for the lock.
        if self.is_fresh(&status) {
            return status.clone();
        }

        match self.client.ping().await {
            Ok(()) => {
                if !status.connected {
                    info!("Platform at {} is reachable", status.base_url);
                }
                status.connected = true;
                status.offline_mode = false;
                status.error = None;
            }
            Err(e) => {
                if !status.offline_mode {
                    warn!("Platform at {} is unreachable, switching to offline mode: {}", status.base_url, e);
                }
                status.connected = false;
                status.offline_mode = true;
                status.error = Some(e.to_string());
            }
        }
        status.last_checked = Some(Utc::now());

        let published = status.clone();
        drop(status);
        if !published.connected || published.user.is_some() {
            return published;
        }

        // User lookup runs outside the lock, single attempt.
        match self.client.get_once::<DataEnvelope<User>>(ME_PATH).await {
            Ok(envelope) => {
                let mut status = self.status.write().await;
                if status.connected && status.user.is_none() {
                    status.user = Some(envelope.data);
                }
                status.clone()
            }
            Err(e) => {
                debug!("Could not load current user: {}", e);
                published
            }
        }
    }

    /// Force the next [`check_connection`](Self::check_connection) to re-probe.
    pub async fn invalidate(&self) {
        let mut status = self.status.write().await;
        status.last_checked = None;
        debug!("Connection status invalidated");
    }

    /// Last known status without probing.
    pub async fn current(&self) -> ConnectionStatus {
        self.status.read().await.clone()
    }
}
