//! # Index Dispatcher
//!
//! Notifies the search service that a repository changed.
//!
//! ## Communication Pattern
//! - One POST per dispatch, body = encrypted `{"RepoID", "RepoPath"}` JSON
//! - HTTP 200 is success, anything else is a failure
//! - Fire-and-forget: [`IndexDispatcher::start_indexing`] spawns a detached
//!   task and the caller never learns the outcome
//! - No retry, no queueing, no deduplication of overlapping dispatches

use crate::cipher::{self, EncryptionKey};
use config::SearchConfig;
use errors::IndexError;
use gin_core::{IndexRequest, Repository};
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

/// Parse an optional endpoint, treating an empty string as unset.
pub(crate) fn parse_endpoint(url: Option<&str>) -> Result<Option<Url>, IndexError> {
    url.map(|u| {
        Url::parse(u).map_err(|e| IndexError::InvalidEndpoint {
            url: u.to_string(),
            reason: e.to_string()
        })
    })
    .transpose()
}

pub(crate) fn build_client(config: &SearchConfig) -> Result<Client, IndexError> {
    Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| IndexError::Transport {
            url: String::new(),
            reason: e.to_string()
        })
}

/// Sends index requests to the search service.
///
/// Cheap to clone; clones share the HTTP connection pool, the key and the
/// in-flight limiter.
#[derive(Debug, Clone)]
pub struct IndexDispatcher {
    endpoint: Option<Url>,
    key: EncryptionKey,
    client: Client,
    limiter: Option<Arc<Semaphore>>
}

impl IndexDispatcher {
    pub fn new(config: &SearchConfig) -> Result<Self, IndexError> {
        Ok(Self {
            endpoint: parse_endpoint(config.index_endpoint())?,
            key: EncryptionKey::new(config.key.as_bytes()),
            client: build_client(config)?,
            limiter: config
                .max_in_flight
                .map(|max| Arc::new(Semaphore::new(max)))
        })
    }

    /// Whether an index endpoint is configured.
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Schedule one dispatch for `repo` and return immediately.
    ///
    /// Returns `None` when indexing is disabled (or no runtime is available
    /// to run the task). The handle resolves once the dispatch finished; it
    /// does not carry the outcome, which is only logged.
    pub fn start_indexing(&self, repo: &Repository) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            trace!("Indexing not enabled");
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!(repo_id = repo.id, error = %e, "No runtime to schedule index request on");
                return None;
            }
        };

        let dispatcher = self.clone();
        let repo = repo.clone();
        Some(runtime.spawn(async move {
            let _permit = match &dispatcher.limiter {
                Some(limiter) => limiter.clone().acquire_owned().await.ok(),
                None => None
            };

            trace!(repo_id = repo.id, "Indexing repository");
            match dispatcher.dispatch(&repo).await {
                Ok(()) => {
                    metrics::counter!("gin_index_dispatch_total", "outcome" => "ok").increment(1);
                    debug!(repo_id = repo.id, repo_path = %repo.full_name(), "Index request accepted");
                }
                Err(e) => {
                    metrics::counter!("gin_index_dispatch_total", "outcome" => e.kind())
                        .increment(1);
                    error!(
                        repo_id = repo.id,
                        repo_path = %repo.full_name(),
                        error = %e,
                        "Error submitting index request"
                    );
                }
            }
        }))
    }

    /// Perform a single dispatch and report its outcome.
    ///
    /// This is the body of the task [`start_indexing`](Self::start_indexing)
    /// spawns; callers that need the result (operator tooling) can await it
    /// directly.
    pub async fn dispatch(&self, repo: &Repository) -> Result<(), IndexError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| IndexError::NotConfigured {
                setting: "index_url".to_string()
            })?;

        let body = self.encrypt_request(&IndexRequest::from(repo))?;

        let response = self
            .client
            .post(endpoint.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| IndexError::Transport {
                url: endpoint.to_string(),
                reason: e.to_string()
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(IndexError::UnexpectedStatus {
                url: endpoint.to_string(),
                status: status.as_u16()
            })
        }
    }

    fn encrypt_request(&self, request: &IndexRequest) -> Result<String, IndexError> {
        let data = serde_json::to_string(request).map_err(|e| IndexError::Serialization {
            payload: "index request".to_string(),
            reason: e.to_string()
        })?;
        cipher::encrypt(self.key.as_bytes(), &data).map_err(|source| IndexError::Encryption {
            payload: "index request".to_string(),
            source
        })
    }
}
