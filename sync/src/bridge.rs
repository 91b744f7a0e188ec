use crate::error::{Result, SyncError};
use crate::events::{EventOutcome, RepositoryEvent};
use annex::AnnexLifecycle;
use dashmap::DashMap;
use indexing::IndexDispatcher;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Routes repository events to the annex lifecycle and the index dispatcher.
///
/// Annex work runs on the blocking pool. Work on one repository path is
/// serialized; different paths run concurrently. A path keeps a lock
/// entry only while work on it is running or queued.
#[derive(Debug, Clone)]
pub struct SyncBridge {
    annex: AnnexLifecycle,
    dispatcher: IndexDispatcher,
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>
}

impl SyncBridge {
    pub fn new(annex: AnnexLifecycle, dispatcher: IndexDispatcher) -> Self {
        Self {
            annex,
            dispatcher,
            locks: Arc::new(DashMap::new())
        }
    }

    #[tracing::instrument(skip(self, event), fields(event = event.kind(), repo_id = event.repository().id))]
    pub async fn handle(&self, event: RepositoryEvent) -> Result<EventOutcome> {
        match event {
            RepositoryEvent::Created(repo) => {
                let setup = self
                    .run_annex(&repo.path, |annex, path| annex.setup(path))
                    .await??;
                let dispatch = self.dispatcher.start_indexing(&repo);
                info!(repo_path = %repo.full_name(), "Repository set up");
                Ok(EventOutcome::Created { setup, dispatch })
            }
            RepositoryEvent::ContentPushed(repo) => {
                let synced = self
                    .run_annex(&repo.path, |annex, path| annex.sync(path))
                    .await;
                // Whatever did reach the annex is worth indexing.
                let dispatch = self.dispatcher.start_indexing(&repo);
                match synced {
                    Ok(Ok(())) => {
                        debug!(repo_path = %repo.full_name(), "Content synchronized");
                        Ok(EventOutcome::ContentPushed { dispatch })
                    }
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(e)
                }
            }
            RepositoryEvent::Deleted(repo) => {
                let teardown = self
                    .run_annex(&repo.path, |annex, path| annex.teardown(path))
                    .await?;
                if !teardown.is_clean() {
                    warn!(repo_path = %repo.full_name(), "Annex uninit failed, permissions remediated");
                }
                Ok(EventOutcome::Deleted { teardown })
            }
        }
    }

    async fn run_annex<T, F>(&self, path: &Path, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&AnnexLifecycle, &Path) -> T + Send + 'static
    {
        // Held by the blocking job itself, so it outlives a cancelled caller.
        let guard = self.path_lock(path).lock_owned().await;

        let annex = self.annex.clone();
        let owned = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            op(&annex, &owned)
        })
        .await
        .map_err(|e| SyncError::Worker {
            path: path.display().to_string(),
            reason: e.to_string()
        });

        self.forget(path);
        result
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Drop the lock of an idle repository unless someone holds or waits on it.
    fn forget(&self, path: &Path) {
        self.locks
            .remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of repository paths with a live lock entry.
    pub fn tracked_paths(&self) -> usize {
        self.locks.len()
    }
}
