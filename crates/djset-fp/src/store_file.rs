//! JSON store format
//!
//! A mapping from track id to `{title, artist, hashes}`. Keys are written in
//! sorted order so saved files diff cleanly.

use crate::FpError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One track entry as it appears on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredTrack {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub hashes: Vec<String>,
}

/// Complete store file: track id -> entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreFile {
    pub tracks: BTreeMap<String, StoredTrack>,
}

impl StoreFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, track_id: String, track: StoredTrack) {
        self.tracks.insert(track_id, track);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self, FpError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, FpError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> Result<(), FpError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> Result<Self, FpError> {
        let json_str = std::fs::read_to_string(path)?;
        Self::from_json_str(&json_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let file = StoreFile::from_json_str(r#"{"track-01": {"hashes": ["ab"]}}"#).unwrap();
        let track = &file.tracks["track-01"];
        assert_eq!(track.title, None);
        assert_eq!(track.artist, None);
        assert_eq!(track.hashes, vec!["ab".to_string()]);
    }

    #[test]
    fn test_keys_written_sorted() {
        let mut file = StoreFile::new();
        file.insert("zulu".into(), StoredTrack::default());
        file.insert("alpha".into(), StoredTrack::default());
        let json = file.to_json_pretty().unwrap();
        assert!(json.find("alpha").unwrap() < json.find("zulu").unwrap());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingerprints.json");
        let mut file = StoreFile::new();
        file.insert(
            "track-01".into(),
            StoredTrack {
                title: Some("Windowlicker".into()),
                artist: Some("Aphex Twin".into()),
                hashes: vec!["00ff".into(), "0f0f".into()],
            },
        );
        file.save(&path).unwrap();
        assert_eq!(StoreFile::load(&path).unwrap(), file);
    }
}
