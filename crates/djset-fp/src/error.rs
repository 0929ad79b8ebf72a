//! Errors raised while reading or writing store files

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("invalid snapshot: magic bytes mismatch")]
    BadMagic,

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),

    #[error("snapshot checksum mismatch (expected {expected:#018x}, found {found:#018x})")]
    ChecksumMismatch { expected: u64, found: u64 },

    #[error("snapshot truncated: {0}")]
    Truncated(&'static str),

    #[error("{0} records do not fit in a snapshot header")]
    TooManyRecords(usize),

    #[error("unrecognised store file extension: {0}")]
    UnknownFormat(String),
}
