use crate::dispatcher::IndexDispatcher;
use errors::IndexError;
use gin_core::RepositoryStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, trace};

/// Sends every known repository to the search service.
pub struct IndexRebuilder {
    store: Arc<dyn RepositoryStore>,
    dispatcher: IndexDispatcher
}

/// Dispatches scheduled by one rebuild.
///
/// Dropping it leaves the dispatches running; [`wait`](Self::wait) only
/// tells when they have all finished, never how they went.
#[derive(Debug)]
pub struct ScheduledRebuild {
    handles: Vec<JoinHandle<()>>
}

impl ScheduledRebuild {
    pub fn scheduled(&self) -> usize {
        self.handles.len()
    }

    pub async fn wait(self) {
        for handle in self.handles {
            // A panicked dispatch task only affects its own repository.
            let _ = handle.await;
        }
    }
}

impl IndexRebuilder {
    pub fn new(store: Arc<dyn RepositoryStore>, dispatcher: IndexDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Schedule one dispatch per repository and return without waiting for
    /// any of them.
    ///
    /// Fails up front, with no store read and no network traffic, when no
    /// index endpoint is configured.
    pub async fn rebuild_index(&self) -> Result<ScheduledRebuild, IndexError> {
        if !self.dispatcher.is_enabled() {
            return Err(IndexError::NotConfigured {
                setting: "index_url".to_string()
            });
        }

        let repos = self.store.list_repositories().await?;
        trace!("Found {} repositories to index", repos.len());

        let handles: Vec<JoinHandle<()>> = repos
            .iter()
            .filter_map(|repo| self.dispatcher.start_indexing(repo))
            .collect();

        info!(scheduled = handles.len(), "Rebuilding search index");
        Ok(ScheduledRebuild { handles })
    }
}
