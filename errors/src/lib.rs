//! # Sidecar Errors
//!
//! Error definitions shared by the indexing and annex subsystems.
//!
//! - Uses `thiserror` for structured error definitions
//! - Named fields in every message so log lines stay greppable
//! - Dispatch-path errors are logged by the dispatcher and never reach the
//!   repository operation that triggered them

use thiserror::Error;

/// Payload cipher errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid key: {length} bytes, expected 16 or 32")]
    InvalidKey { length: usize },

    #[error("Encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error("Decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    #[error("Invalid encrypted data format: {reason}")]
    InvalidFormat { reason: String }
}

/// Repository store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Repository not found: {id}")]
    NotFound { id: i64 },

    #[error("Repository store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Repository manifest {path} could not be read: {reason}")]
    Manifest { path: String, reason: String }
}

/// Search service dispatch errors
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Indexing service not configured: {setting} is empty")]
    NotConfigured { setting: String },

    #[error("Could not serialize {payload}: {reason}")]
    Serialization { payload: String, reason: String },

    #[error("Could not encrypt {payload}: {source}")]
    Encryption {
        payload: String,
        #[source]
        source: CipherError
    },

    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Request to {url} returned status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Could not decode response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Get all repos: {0}")]
    Store(#[from] StoreError)
}

impl IndexError {
    /// Short label used as the `outcome` dimension on dispatch metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured { .. } => "not_configured",
            Self::InvalidEndpoint { .. } => "invalid_endpoint",
            Self::Serialization { .. } => "serialization",
            Self::Encryption { .. } => "encryption",
            Self::Transport { .. } => "transport",
            Self::UnexpectedStatus { .. } => "status",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Store(_) => "store"
        }
    }
}

/// A single annex tool invocation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{command} failed: {reason} ({message})")]
pub struct AnnexCommandError {
    /// The command line that was run, e.g. `git annex init --version=7`.
    pub command: String,
    /// Why the invocation failed (spawn error or exit status).
    pub reason: String,
    /// Whatever the tool printed, trimmed.
    pub message: String
}

/// Annex lifecycle errors
#[derive(Debug, Error)]
pub enum AnnexError {
    #[error("Annex init failed at {path}: {source}")]
    InitFailed {
        path: String,
        #[source]
        source: AnnexCommandError
    },

    #[error("Annex step {step} failed at {path}: {source}")]
    StepFailed {
        step: String,
        path: String,
        #[source]
        source: AnnexCommandError
    },

    #[error("git annex sync --content [{path}]")]
    SyncFailed {
        path: String,
        #[source]
        source: AnnexCommandError
    },

    #[error("Failed to change permissions on {path}: {reason}")]
    PermissionRemediation { path: String, reason: String }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_failed_names_path() {
        let err = AnnexError::SyncFailed {
            path: "/data/repos/alice/myrepo.git".to_string(),
            source: AnnexCommandError {
                command: "git annex sync --content".to_string(),
                reason: "exit status: 1".to_string(),
                message: "remote not initialised".to_string()
            }
        };
        assert_eq!(
            err.to_string(),
            "git annex sync --content [/data/repos/alice/myrepo.git]"
        );
    }

    #[test]
    fn test_index_error_kind_labels() {
        let errors = vec![
            (
                IndexError::NotConfigured {
                    setting: "index_url".to_string()
                },
                "not_configured"
            ),
            (
                IndexError::UnexpectedStatus {
                    url: "http://dex".to_string(),
                    status: 500
                },
                "status"
            ),
            (
                IndexError::Encryption {
                    payload: "index request".to_string(),
                    source: CipherError::InvalidKey { length: 3 }
                },
                "encryption"
            ),
            (IndexError::Store(StoreError::NotFound { id: 1 }), "store"),
        ];

        for (error, expected) in errors {
            assert_eq!(error.kind(), expected);
        }
    }

    #[test]
    fn test_command_error_display() {
        let err = AnnexCommandError {
            command: "git annex uninit".to_string(),
            reason: "exit status: 1".to_string(),
            message: "permission denied".to_string()
        };
        assert_eq!(
            err.to_string(),
            "git annex uninit failed: exit status: 1 (permission denied)"
        );
    }
}
