//! Errors of the music workflow.
//!
//! Repository and file store calls keep returning `anyhow::Result`, they are
//! folded into [`MusicError::Internal`] unless the workflow classifies them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MusicError {
    /// Rejected before the provider is called
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("music task {0} not found")]
    NotFound(i64),

    /// Provider call failed or answered something unreadable
    #[error("provider error: {0}")]
    Upstream(String),

    /// Media download or re-upload failed
    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MusicError>;
