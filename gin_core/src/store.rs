use crate::traits::RepositoryStore;
use crate::types::Repository;
use async_trait::async_trait;
use errors::StoreError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Repository store backed by a map in memory.
///
/// Used by the CLI (seeded from a JSON manifest) and by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepositoryStore {
    repos: Arc<RwLock<BTreeMap<i64, Repository>>>
}

impl InMemoryRepositoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repositories(repos: impl IntoIterator<Item = Repository>) -> Self {
        let map = repos.into_iter().map(|r| (r.id, r)).collect();
        Self {
            repos: Arc::new(RwLock::new(map))
        }
    }

    /// Load a JSON array of repositories, e.g. an export from the hosting
    /// platform's database.
    pub fn from_manifest(path: &Path) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StoreError::Manifest {
            path: path.display().to_string(),
            reason: e.to_string()
        })?;
        let repos: Vec<Repository> =
            serde_json::from_str(&contents).map_err(|e| StoreError::Manifest {
                path: path.display().to_string(),
                reason: e.to_string()
            })?;
        tracing::debug!(count = repos.len(), path = %path.display(), "Loaded repository manifest");
        Ok(Self::with_repositories(repos))
    }

    pub async fn insert(&self, repo: Repository) {
        self.repos.write().await.insert(repo.id, repo);
    }

    pub async fn remove(&self, id: i64) -> Option<Repository> {
        self.repos.write().await.remove(&id)
    }
}

#[async_trait]
impl RepositoryStore for InMemoryRepositoryStore {
    async fn list_repositories(&self) -> Result<Vec<Repository>, StoreError> {
        Ok(self.repos.read().await.values().cloned().collect())
    }

    async fn get_repository(&self, id: i64) -> Result<Repository, StoreError> {
        self.repos
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { id })
    }
}
