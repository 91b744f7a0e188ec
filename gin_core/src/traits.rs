//! Core traits for the sidecar subsystems

use crate::types::Repository;
use async_trait::async_trait;
use errors::StoreError;

/// Read access to the repositories known to the hosting platform.
///
/// The sidecar subsystems never write through this trait; the
/// repository-management layer owns the records.
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Every repository, in one bulk read.
    async fn list_repositories(&self) -> Result<Vec<Repository>, StoreError>;

    async fn get_repository(&self, id: i64) -> Result<Repository, StoreError>;
}
