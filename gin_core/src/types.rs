use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A hosted repository as seen by the sidecar subsystems.
///
/// Owned by the repository-management layer; nothing in this workspace
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub owner: String,
    pub name: String,
    /// On-disk location of the repository, where the annex sidecar lives.
    pub path: PathBuf
}

impl Repository {
    pub fn new(id: i64, owner: impl Into<String>, name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            id,
            owner: owner.into(),
            name: name.into(),
            path
        }
    }

    /// `owner/name`, the path the search service knows the repository by.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.full_name())
    }
}

/// Request body sent to the search service when a repository changed.
///
/// Serialized as `{"RepoID": <int64>, "RepoPath": "<owner/name>"}` and
/// encrypted before it leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRequest {
    #[serde(rename = "RepoID")]
    pub repo_id: i64,
    #[serde(rename = "RepoPath")]
    pub repo_path: String
}

impl From<&Repository> for IndexRequest {
    fn from(repo: &Repository) -> Self {
        Self {
            repo_id: repo.id,
            repo_path: repo.full_name()
        }
    }
}
