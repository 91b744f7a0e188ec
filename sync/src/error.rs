use errors::AnnexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Annex error: {0}")]
    Annex(#[from] AnnexError),

    #[error("Annex worker for {path} did not complete: {reason}")]
    Worker { path: String, reason: String }
}

pub type Result<T> = std::result::Result<T, SyncError>;
