//! In-memory read cache for the project hierarchy.
//!
//! Each level is keyed by its parent id. Staleness is tracked with a single
//! `last_updated` stamp for the whole cache: any `set_*` call marks every
//! level fresh. Getters return `None` for a level that was never fetched and
//! `Some(vec![])` for one that was fetched and empty.

use std::collections::HashMap;
use std::time::Duration;

use agentic_core::{Product, ProductId, Project, ProjectId, Spec, SpecId, Task, Time};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct CacheState {
    projects: Option<Vec<Project>>,
    products: HashMap<ProjectId, Vec<Product>>,
    specs: HashMap<ProductId, Vec<Spec>>,
    tasks: HashMap<SpecId, Vec<Task>>,
    last_updated: Option<Time>,
}

impl CacheState {
    fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }
}

/// Last-known hierarchy snapshot.
#[derive(Default)]
pub struct ReadCache {
    state: RwLock<CacheState>,
}

impl ReadCache {
    /// Empty cache; always stale until the first `set_*`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the project list.
    pub async fn set_projects(&self, projects: Vec<Project>) {
        let mut state = self.state.write().await;
        state.projects = Some(projects);
        state.touch();
    }

    /// Cached project list.
    pub async fn get_projects(&self) -> Option<Vec<Project>> {
        self.state.read().await.projects.clone()
    }

    /// Replace the products of a project.
    pub async fn set_products(&self, project_id: &ProjectId, products: Vec<Product>) {
        let mut state = self.state.write().await;
        state.products.insert(project_id.clone(), products);
        state.touch();
    }

    /// Cached products of a project.
    pub async fn get_products(&self, project_id: &ProjectId) -> Option<Vec<Product>> {
        self.state.read().await.products.get(project_id).cloned()
    }

    /// Replace the specs of a product.
    pub async fn set_specs(&self, product_id: &ProductId, specs: Vec<Spec>) {
        let mut state = self.state.write().await;
        state.specs.insert(product_id.clone(), specs);
        state.touch();
    }

    /// Cached specs of a product.
    pub async fn get_specs(&self, product_id: &ProductId) -> Option<Vec<Spec>> {
        self.state.read().await.specs.get(product_id).cloned()
    }

    /// Replace the tasks of a spec.
    pub async fn set_tasks(&self, spec_id: &SpecId, tasks: Vec<Task>) {
        let mut state = self.state.write().await;
        state.tasks.insert(spec_id.clone(), tasks);
        state.touch();
    }

    /// Cached tasks of a spec.
    pub async fn get_tasks(&self, spec_id: &SpecId) -> Option<Vec<Task>> {
        self.state.read().await.tasks.get(spec_id).cloned()
    }

    /// Drop everything and reset the timestamp.
    pub async fn invalidate(&self) {
        *self.state.write().await = CacheState::default();
        debug!("Read cache invalidated");
    }

    /// When any level was last refreshed.
    pub async fn last_updated(&self) -> Option<Time> {
        self.state.read().await.last_updated
    }

    /// True if never populated or last refreshed more than `max_age` ago.
    pub async fn is_stale(&self, max_age: Duration) -> bool {
        match self.state.read().await.last_updated {
            None => true,
            // A negative age (clock stepped back) counts as fresh.
            Some(updated) => (Utc::now() - updated)
                .to_std()
                .map(|age| age > max_age)
                .unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentic_core::TaskStatus;

    fn project(id: &str) -> Project {
        Project {
            id: ProjectId::parse(id).unwrap(),
            name: format!("Project {id}"),
            description: String::new(),
        }
    }

    fn task(id: &str, spec: &SpecId) -> Task {
        Task {
            id: agentic_core::TaskId::parse(id).unwrap(),
            spec_id: spec.clone(),
            title: id.to_string(),
            description: String::new(),
            status: TaskStatus::Planned,
            checkpoint_mode: None,
        }
    }

    #[tokio::test]
    async fn test_empty_cache_is_always_stale() {
        let cache = ReadCache::new();
        assert!(cache.is_stale(Duration::ZERO).await);
        assert!(cache.is_stale(Duration::from_secs(86_400 * 365)).await);
        assert!(cache.last_updated().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_after_set_then_stale_after_max_age() {
        let cache = ReadCache::new();
        cache.set_projects(vec![project("p1")]).await;
        assert!(!cache.is_stale(Duration::from_secs(3600)).await);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.is_stale(Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_presence_distinguishes_empty_from_missing() {
        let cache = ReadCache::new();
        let spec = SpecId::parse("s1").unwrap();
        let other = SpecId::parse("s2").unwrap();

        assert_eq!(cache.get_tasks(&spec).await, None);
        cache.set_tasks(&spec, vec![]).await;
        assert_eq!(cache.get_tasks(&spec).await, Some(vec![]));
        assert_eq!(cache.get_tasks(&other).await, None);
    }

    #[tokio::test]
    async fn test_levels_are_keyed_by_parent() {
        let cache = ReadCache::new();
        let s1 = SpecId::parse("s1").unwrap();
        let s2 = SpecId::parse("s2").unwrap();
        cache.set_tasks(&s1, vec![task("t1", &s1)]).await;
        cache.set_tasks(&s2, vec![task("t2", &s2), task("t3", &s2)]).await;

        assert_eq!(cache.get_tasks(&s1).await.unwrap().len(), 1);
        assert_eq!(cache.get_tasks(&s2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_clears_every_level() {
        let cache = ReadCache::new();
        let project_id = ProjectId::parse("p1").unwrap();
        cache.set_projects(vec![project("p1")]).await;
        cache.set_products(&project_id, vec![]).await;

        cache.invalidate().await;

        assert!(cache.get_projects().await.is_none());
        assert!(cache.get_products(&project_id).await.is_none());
        assert!(cache.last_updated().await.is_none());
        assert!(cache.is_stale(Duration::from_secs(3600)).await);
    }
}
