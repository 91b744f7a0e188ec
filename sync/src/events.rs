use annex::{SetupReport, TeardownReport};
use gin_core::Repository;
use tokio::task::JoinHandle;

/// Something happened to a repository that the sidecar must follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryEvent {
    Created(Repository),
    /// New content arrived (push or web upload).
    ContentPushed(Repository),
    /// The repository is about to be deleted from disk.
    Deleted(Repository)
}

impl RepositoryEvent {
    pub fn repository(&self) -> &Repository {
        match self {
            Self::Created(repo) | Self::ContentPushed(repo) | Self::Deleted(repo) => repo
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::ContentPushed(_) => "content_pushed",
            Self::Deleted(_) => "deleted"
        }
    }
}

/// Result of handling one [`RepositoryEvent`].
///
/// `dispatch` is the scheduled index request, if indexing is enabled.
/// Awaiting it is optional.
#[derive(Debug)]
pub enum EventOutcome {
    Created {
        setup: SetupReport,
        dispatch: Option<JoinHandle<()>>
    },
    ContentPushed {
        dispatch: Option<JoinHandle<()>>
    },
    Deleted {
        teardown: TeardownReport
    }
}

impl EventOutcome {
    pub fn take_dispatch(&mut self) -> Option<JoinHandle<()>> {
        match self {
            Self::Created { dispatch, .. } | Self::ContentPushed { dispatch } => dispatch.take(),
            Self::Deleted { .. } => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_event_accessors() {
        let repo = Repository::new(7, "alice", "data", PathBuf::from("/data/repos/alice/data.git"));
        let event = RepositoryEvent::ContentPushed(repo.clone());
        assert_eq!(event.repository(), &repo);
        assert_eq!(event.kind(), "content_pushed");
        assert_eq!(RepositoryEvent::Deleted(repo).kind(), "deleted");
    }
}
