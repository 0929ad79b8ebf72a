//! djset fingerprint store and playlist file formats
//!
//! The store is persisted either as human-editable JSON or as a compact
//! binary snapshot. Playlists are exported as a flat JSON array.

pub mod error;
pub mod playlist;
pub mod snapshot;
pub mod store_file;

pub use error::FpError;
pub use playlist::PlaylistEntry;
pub use snapshot::{SnapshotHeader, SnapshotReader, SnapshotWriter, MAGIC, VERSION};
pub use store_file::{StoreFile, StoredTrack};

use std::path::Path;

/// On-disk representation of a store file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFormat {
    Json,
    Snapshot,
}

impl StoreFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Result<Self, FpError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(StoreFormat::Json),
            Some("djfp") => Ok(StoreFormat::Snapshot),
            _ => Err(FpError::UnknownFormat(path.display().to_string())),
        }
    }
}

/// Load a store file in whichever format its extension names
pub fn load_auto(path: &Path) -> Result<StoreFile, FpError> {
    match StoreFormat::from_path(path)? {
        StoreFormat::Json => StoreFile::load(path),
        StoreFormat::Snapshot => SnapshotReader::read(path),
    }
}

/// Save a store file in whichever format its extension names
pub fn save_auto(path: &Path, file: &StoreFile) -> Result<(), FpError> {
    match StoreFormat::from_path(path)? {
        StoreFormat::Json => file.save(path),
        StoreFormat::Snapshot => SnapshotWriter::new().write(path, file),
    }
}
