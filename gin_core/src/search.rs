//! Request and response types for the search service query API.
//!
//! Field names follow the service's wire format exactly, including the
//! `Querry` spelling it expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the search service should interpret a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum SearchKind {
    #[default]
    Match,
    Fuzzy,
    Wildcard,
    Query,
    Suggest
}

impl From<SearchKind> for i64 {
    fn from(kind: SearchKind) -> Self {
        match kind {
            SearchKind::Match => 0,
            SearchKind::Fuzzy => 1,
            SearchKind::Wildcard => 2,
            SearchKind::Query => 3,
            SearchKind::Suggest => 4
        }
    }
}

impl TryFrom<i64> for SearchKind {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Match),
            1 => Ok(Self::Fuzzy),
            2 => Ok(Self::Wildcard),
            3 => Ok(Self::Query),
            4 => Ok(Self::Suggest),
            other => Err(format!("unknown search type {other}"))
        }
    }
}

impl std::str::FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "match" => Ok(Self::Match),
            "fuzzy" => Ok(Self::Fuzzy),
            "wildcard" => Ok(Self::Wildcard),
            "query" => Ok(Self::Query),
            "suggest" => Ok(Self::Suggest),
            other => Err(format!("unknown search type {other}"))
        }
    }
}

/// Query sent (encrypted) to the search service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "CsrfT")]
    pub csrf_token: String,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    #[serde(rename = "Querry")]
    pub query: String,
    #[serde(rename = "SType")]
    pub kind: SearchKind
}

/// An indexed file blob.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexBlob {
    #[serde(rename = "GinRepoName")]
    pub repo_name: String,
    #[serde(rename = "GinRepoId")]
    pub repo_id: String,
    #[serde(rename = "FirstCommit")]
    pub first_commit: String,
    #[serde(rename = "Id")]
    pub id: i64,
    /// Object id as emitted by the service; kept opaque.
    #[serde(rename = "Oid")]
    pub oid: Value,
    #[serde(rename = "IndexingTime")]
    pub indexing_time: Option<DateTime<Utc>>,
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "Path")]
    pub path: String,
    /// Blob metadata the service embeds alongside the fields above.
    #[serde(flatten)]
    pub details: Map<String, Value>
}

/// An indexed commit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexCommit {
    #[serde(rename = "GinRepoId")]
    pub repo_id: String,
    #[serde(rename = "Oid")]
    pub oid: Value,
    #[serde(rename = "GinRepoName")]
    pub repo_name: String,
    #[serde(rename = "IndexingTime")]
    pub indexing_time: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub details: Map<String, Value>
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlobResult {
    #[serde(rename = "_source")]
    pub source: Option<IndexBlob>,
    #[serde(rename = "_score", default)]
    pub score: f64,
    #[serde(default)]
    pub highlight: Value
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommitResult {
    #[serde(rename = "_source")]
    pub source: Option<IndexCommit>,
    #[serde(rename = "_score", default)]
    pub score: f64,
    #[serde(default)]
    pub highlight: Value
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(rename = "Blobs", default, deserialize_with = "null_as_empty")]
    pub blobs: Vec<BlobResult>,
    #[serde(rename = "Commits", default, deserialize_with = "null_as_empty")]
    pub commits: Vec<CommitResult>
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty() && self.commits.is_empty()
    }
}

// The service encodes empty result lists as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
