//! Match results and the final playlist

use crate::segmentation::Segment;
use crate::store::FingerprintRecord;
use djset_fp::PlaylistEntry;

/// Identity assigned to one segment; `track_id == None` means unidentified
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub segment: Segment,
    pub track_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub confidence: f64,
}

impl Match {
    pub fn unidentified(segment: Segment) -> Self {
        Self {
            segment,
            track_id: None,
            title: None,
            artist: None,
            confidence: 0.0,
        }
    }

    pub fn identified(segment: Segment, record: &FingerprintRecord, confidence: f64) -> Self {
        Self {
            segment,
            track_id: Some(record.track_id.clone()),
            title: Some(record.title.clone()),
            artist: Some(record.artist.clone()),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_identified(&self) -> bool {
        self.track_id.is_some()
    }

    pub fn start(&self) -> f64 {
        self.segment.start
    }

    pub fn end(&self) -> f64 {
        self.segment.end
    }

    pub fn duration(&self) -> f64 {
        self.segment.duration()
    }

    pub fn to_entry(&self) -> PlaylistEntry {
        PlaylistEntry {
            start: self.segment.start,
            end: self.segment.end,
            track_id: self.track_id.clone(),
            title: self.title.clone(),
            artist: self.artist.clone(),
            confidence: self.confidence,
        }
    }
}

/// Consolidated, time-ordered matches covering the whole recording
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    matches: Vec<Match>,
}

impl Playlist {
    pub(crate) fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of entries with an identity
    pub fn identified_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_identified()).count()
    }

    pub fn entries(&self) -> Vec<PlaylistEntry> {
        self.matches.iter().map(Match::to_entry).collect()
    }

    /// Export as a pretty JSON array
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(djset_fp::playlist::to_json_pretty(&self.entries())?)
    }
}

impl IntoIterator for Playlist {
    type Item = Match;
    type IntoIter = std::vec::IntoIter<Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}
