//! Caller-facing facade over the client, cache, probe and syncer.
//!
//! Read paths serve fresh cached data directly. Otherwise they consult the
//! connection probe: offline callers get the cached copy (even if stale), and
//! online callers fetch, refill the cache and get the new data.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use agentic_client::{ClientError, ConnectionProbe, PlatformClient};
use agentic_core::{
    ConnectionStatus, Product, ProductId, Project, ProjectId, SessionState, Spec, SpecId,
    SubTask, SyncStatus, Task, TaskId, TaskStatus,
};
use agentic_storage::JsonQueueStore;
use tracing::{debug, warn};

use crate::cache::ReadCache;
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::queue::FlushReport;
use crate::syncer::StatusSyncer;

/// Platform access for UI and session code.
pub struct PlatformService {
    client: PlatformClient,
    cache: ReadCache,
    probe: Arc<ConnectionProbe>,
    syncer: StatusSyncer,
    cache_max_age: Duration,
}

impl PlatformService {
    /// Build the service with its own probe, restoring any persisted queue.
    pub async fn new(client: PlatformClient, config: SyncConfig) -> Result<Self> {
        let probe = Arc::new(ConnectionProbe::with_ttl(client.clone(), config.probe_ttl));
        Self::with_probe(client, probe, config).await
    }

    /// Build the service around a shared probe.
    pub async fn with_probe(
        client: PlatformClient,
        probe: Arc<ConnectionProbe>,
        config: SyncConfig,
    ) -> Result<Self> {
        let mut syncer = StatusSyncer::new(Arc::new(client.clone()), config.max_queue_retries);
        if let Some(path) = &config.queue_path {
            syncer = syncer.with_store(Arc::new(JsonQueueStore::new(path))).await?;
        }

        Ok(Self {
            client,
            cache: ReadCache::new(),
            probe,
            syncer,
            cache_max_age: config.cache_max_age,
        })
    }

    /// Underlying client.
    pub fn client(&self) -> &PlatformClient {
        &self.client
    }

    /// Hierarchy cache.
    pub fn cache(&self) -> &ReadCache {
        &self.cache
    }

    /// Status syncer.
    pub fn syncer(&self) -> &StatusSyncer {
        &self.syncer
    }

    // ==================== Connectivity ====================

    /// Reachability, re-probed at most once per probe TTL.
    pub async fn connection_status(&self) -> ConnectionStatus {
        self.probe.check_connection().await
    }

    /// Re-probe now, e.g. after the user retried or changed credentials.
    pub async fn reconnect(&self) -> ConnectionStatus {
        self.probe.invalidate().await;
        self.probe.check_connection().await
    }

    // ==================== Hierarchy reads ====================

    async fn read_through<T, F>(
        &self,
        what: &'static str,
        cached: Option<Vec<T>>,
        fetch: F,
    ) -> Result<(Vec<T>, bool)>
    where
        T: Clone,
        F: Future<Output = std::result::Result<Vec<T>, ClientError>>,
    {
        if let Some(hit) = &cached {
            if !self.cache.is_stale(self.cache_max_age).await {
                debug!("Serving {} from cache", what);
                return Ok((hit.clone(), false));
            }
        }

        let connection = self.probe.check_connection().await;
        if connection.offline_mode {
            self.syncer.mark_offline().await;
            return match cached {
                Some(stale) => {
                    debug!("Offline, serving cached {}", what);
                    Ok((stale, false))
                }
                None => Err(SyncError::Offline(what)),
            };
        }

        match fetch.await {
            Ok(items) => Ok((items, true)),
            Err(source) => match cached {
                Some(stale) if source.is_transient() => {
                    warn!("Failed to refresh {}, serving stale copy: {}", what, source);
                    Ok((stale, false))
                }
                _ => Err(SyncError::Fetch { what, source }),
            },
        }
    }

    /// All projects.
    pub async fn projects(&self) -> Result<Vec<Project>> {
        let cached = self.cache.get_projects().await;
        let (projects, fetched) = self
            .read_through("projects", cached, self.client.projects())
            .await?;
        if fetched {
            self.cache.set_projects(projects.clone()).await;
        }
        Ok(projects)
    }

    /// Products of a project.
    pub async fn products(&self, project_id: &ProjectId) -> Result<Vec<Product>> {
        let cached = self.cache.get_products(project_id).await;
        let (products, fetched) = self
            .read_through("products", cached, self.client.products(project_id))
            .await?;
        if fetched {
            self.cache.set_products(project_id, products.clone()).await;
        }
        Ok(products)
    }

    /// Specs of a product.
    pub async fn specs(&self, product_id: &ProductId) -> Result<Vec<Spec>> {
        let cached = self.cache.get_specs(product_id).await;
        let (specs, fetched) = self
            .read_through("specs", cached, self.client.specs(product_id))
            .await?;
        if fetched {
            self.cache.set_specs(product_id, specs.clone()).await;
        }
        Ok(specs)
    }

    /// Tasks of a spec.
    pub async fn tasks(&self, spec_id: &SpecId) -> Result<Vec<Task>> {
        let cached = self.cache.get_tasks(spec_id).await;
        let (tasks, fetched) = self
            .read_through("tasks", cached, self.client.tasks(spec_id))
            .await?;
        if fetched {
            self.cache.set_tasks(spec_id, tasks.clone()).await;
        }
        Ok(tasks)
    }

    /// A single task, always fetched.
    pub async fn task(&self, task_id: &TaskId) -> Result<Task> {
        self.client
            .task(task_id)
            .await
            .map_err(|source| SyncError::Fetch { what: "task", source })
    }

    /// Sub-tasks of a task, always fetched.
    pub async fn subtasks(&self, task_id: &TaskId) -> Result<Vec<SubTask>> {
        self.client
            .subtasks(task_id)
            .await
            .map_err(|source| SyncError::Fetch { what: "subtasks", source })
    }

    /// Drop all cached hierarchy data.
    pub async fn invalidate_cache(&self) {
        self.cache.invalidate().await;
    }

    // ==================== Status writes ====================

    /// Queue a task status.
    pub async fn push_status_update(&self, task_id: &str, status: &str) -> Result<()> {
        self.syncer.push_status_update(task_id, status).await
    }

    /// Map a local session transition onto the task and queue it.
    pub async fn report_session_state(
        &self,
        task_id: &TaskId,
        state: SessionState,
    ) -> Result<Option<TaskStatus>> {
        self.syncer.report_session_state(task_id, state).await
    }

    /// Send every queued update.
    pub async fn flush_updates(&self) -> Result<FlushReport> {
        self.syncer.flush_updates().await
    }

    /// Sync health snapshot.
    pub async fn sync_status(&self) -> SyncStatus {
        self.syncer.sync_status().await
    }

    /// True iff both statuses are set and differ.
    pub fn detect_status_conflict(&self, local: &str, remote: &str) -> bool {
        StatusSyncer::detect_status_conflict(local, remote)
    }

    /// Compare a locally believed status with the platform's current one.
    pub async fn check_task_conflict(&self, task_id: &TaskId, local: TaskStatus) -> Result<bool> {
        let remote = self.task(task_id).await?;
        Ok(self.detect_status_conflict(local.as_str(), remote.status.as_str()))
    }
}
