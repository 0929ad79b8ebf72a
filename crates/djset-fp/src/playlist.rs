//! Playlist export format

use serde::{Deserialize, Serialize};

/// One exported playlist row. Unidentified rows carry `null` identity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub start: f64,
    pub end: f64,
    pub track_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub confidence: f64,
}

/// Serialize an ordered playlist as a pretty JSON array
pub fn to_json_pretty(entries: &[PlaylistEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unidentified_exports_nulls() {
        let entries = vec![PlaylistEntry {
            start: 0.0,
            end: 12.5,
            track_id: None,
            title: None,
            artist: None,
            confidence: 0.0,
        }];
        let value: serde_json::Value = serde_json::from_str(&to_json_pretty(&entries).unwrap()).unwrap();
        assert!(value[0]["track_id"].is_null());
        assert!(value[0]["title"].is_null());
        assert_eq!(value[0]["end"], 12.5);
    }
}
