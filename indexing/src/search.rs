//! Query client for the search service.

use crate::cipher::{self, EncryptionKey};
use crate::dispatcher::{build_client, parse_endpoint};
use config::SearchConfig;
use errors::IndexError;
use gin_core::{SearchRequest, SearchResults};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

/// Sends encrypted queries to the search service and decodes its results.
#[derive(Debug, Clone)]
pub struct SearchClient {
    endpoint: Option<Url>,
    key: EncryptionKey,
    client: Client
}

impl SearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self, IndexError> {
        Ok(Self {
            endpoint: parse_endpoint(config.search_endpoint())?,
            key: EncryptionKey::new(config.key.as_bytes()),
            client: build_client(config)?
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults, IndexError> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| IndexError::NotConfigured {
                setting: "search_url".to_string()
            })?;

        let data = serde_json::to_string(request).map_err(|e| IndexError::Serialization {
            payload: "search request".to_string(),
            reason: e.to_string()
        })?;
        let body = cipher::encrypt(self.key.as_bytes(), &data).map_err(|source| {
            IndexError::Encryption {
                payload: "search request".to_string(),
                source
            }
        })?;

        debug!(url = %endpoint, kind = ?request.kind, "Sending search request");
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

        if response.status() != StatusCode::OK {
            return Err(IndexError::UnexpectedStatus {
                url: endpoint.to_string(),
                status: response.status().as_u16()
            });
        }

        response
            .json::<SearchResults>()
            .await
            .map_err(|e| IndexError::InvalidResponse {
                url: endpoint.to_string(),
                reason: e.to_string()
            })
    }
}
