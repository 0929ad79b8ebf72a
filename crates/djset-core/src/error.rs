//! Error taxonomy for the identification pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unreadable or corrupt input audio
    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// A stage received input that violates its contract
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A store insert collided with an existing track id
    #[error("track already present in store: {0}")]
    DuplicateTrack(String),

    /// A store update named a track that does not exist
    #[error("unknown track: {0}")]
    UnknownTrack(String),

    /// The run was cancelled before it completed
    #[error("pipeline run cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Format(#[from] djset_fp::FpError),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
