//! In-memory fingerprint store
//!
//! Records are kept ordered by track id so that scans, saves and tie-breaks
//! are deterministic. An inverted index answers exact-hash lookups without a
//! scan.

use crate::fingerprint::Fingerprint;
use crate::{Error, Result};
use djset_fp::{StoreFile, StoredTrack};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

#[cfg(test)]
mod tests;

/// Artist used when a bootstrap entry has none
pub const UNKNOWN_ARTIST: &str = "unknown";

/// A known track and all of its hash variants
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintRecord {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub hashes: BTreeSet<Fingerprint>,
}

impl FingerprintRecord {
    pub fn new(
        track_id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        hashes: impl IntoIterator<Item = Fingerprint>,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            title: title.into(),
            artist: artist.into(),
            hashes: hashes.into_iter().collect(),
        }
    }

    /// Smallest distance from `fingerprint` to any of this record's hashes
    pub fn distance_to(&self, fingerprint: &Fingerprint) -> Option<f64> {
        self.hashes
            .iter()
            .map(|h| fingerprint.distance(h))
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// What to do when a bootstrap entry collides with an existing track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with `Error::DuplicateTrack`
    #[default]
    Reject,
    /// Keep the existing record
    Skip,
    /// Replace the existing record
    Overwrite,
}

/// Outcome of a bootstrap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub added: usize,
    pub skipped: usize,
    pub overwritten: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FingerprintStore {
    records: BTreeMap<String, FingerprintRecord>,
    /// Inverted index: hash -> owning track ids
    index: HashMap<Fingerprint, BTreeSet<String>>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.records.contains_key(track_id)
    }

    pub fn get(&self, track_id: &str) -> Option<&FingerprintRecord> {
        self.records.get(track_id)
    }

    /// Records in track id order
    pub fn iter(&self) -> impl Iterator<Item = &FingerprintRecord> {
        self.records.values()
    }

    /// Add a record. An existing track id is an error unless `overwrite` is set.
    pub fn add(&mut self, record: FingerprintRecord, overwrite: bool) -> Result<()> {
        if self.records.contains_key(&record.track_id) {
            if !overwrite {
                return Err(Error::DuplicateTrack(record.track_id));
            }
            self.remove(&record.track_id);
        }

        for hash in &record.hashes {
            self.index
                .entry(hash.clone())
                .or_default()
                .insert(record.track_id.clone());
        }
        log::trace!("Added {} ({} hashes)", record.track_id, record.hashes.len());
        self.records.insert(record.track_id.clone(), record);
        Ok(())
    }

    /// Attach extra hash variants to an existing track; returns how many were new
    pub fn merge_hashes(
        &mut self,
        track_id: &str,
        hashes: impl IntoIterator<Item = Fingerprint>,
    ) -> Result<usize> {
        let record = self
            .records
            .get_mut(track_id)
            .ok_or_else(|| Error::UnknownTrack(track_id.to_string()))?;

        let mut added = 0;
        for hash in hashes {
            if record.hashes.insert(hash.clone()) {
                self.index
                    .entry(hash)
                    .or_default()
                    .insert(track_id.to_string());
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn remove(&mut self, track_id: &str) -> Option<FingerprintRecord> {
        let record = self.records.remove(track_id)?;
        for hash in &record.hashes {
            if let Some(owners) = self.index.get_mut(hash) {
                owners.remove(track_id);
                if owners.is_empty() {
                    self.index.remove(hash);
                }
            }
        }
        Some(record)
    }

    /// Closest record to `fingerprint` and its distance.
    ///
    /// Ties go to the lexicographically smallest track id. Returns `None`
    /// when no record has any hash.
    pub fn find_best(&self, fingerprint: &Fingerprint) -> Option<(&FingerprintRecord, f64)> {
        if let Some(owners) = self.index.get(fingerprint) {
            if let Some(record) = owners.iter().next().and_then(|id| self.records.get(id)) {
                return Some((record, 0.0));
            }
        }

        let mut best: Option<(&FingerprintRecord, f64)> = None;
        for record in self.records.values() {
            let Some(distance) = record.distance_to(fingerprint) else {
                continue;
            };
            // strict comparison keeps the earliest (smallest) track id on ties
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((record, distance));
            }
        }
        best
    }

    /// Populate the store from its serialized form via repeated `add`
    pub fn bootstrap(&mut self, file: &StoreFile, policy: DuplicatePolicy) -> Result<BootstrapReport> {
        let mut report = BootstrapReport::default();

        for (track_id, entry) in &file.tracks {
            let exists = self.contains(track_id);
            match (exists, policy) {
                (true, DuplicatePolicy::Reject) => {
                    return Err(Error::DuplicateTrack(track_id.clone()));
                }
                (true, DuplicatePolicy::Skip) => {
                    log::warn!("Skipping duplicate track {} during bootstrap", track_id);
                    report.skipped += 1;
                    continue;
                }
                (true, DuplicatePolicy::Overwrite) => report.overwritten += 1,
                (false, _) => report.added += 1,
            }
            self.add(record_from_stored(track_id, entry), exists)?;
        }

        log::info!(
            "Bootstrapped store: {} added, {} overwritten, {} skipped ({} tracks total)",
            report.added,
            report.overwritten,
            report.skipped,
            self.len()
        );
        Ok(report)
    }

    /// Build a store from a serialized file; duplicates cannot occur in a map
    pub fn from_store_file(file: &StoreFile) -> Result<Self> {
        let mut store = Self::new();
        store.bootstrap(file, DuplicatePolicy::Reject)?;
        Ok(store)
    }

    /// Serialized form, keys sorted
    pub fn to_store_file(&self) -> StoreFile {
        let mut file = StoreFile::new();
        for record in self.records.values() {
            file.insert(
                record.track_id.clone(),
                StoredTrack {
                    title: Some(record.title.clone()),
                    artist: Some(record.artist.clone()),
                    hashes: record.hashes.iter().map(|h| h.as_str().to_string()).collect(),
                },
            );
        }
        file
    }

    /// Load a `.json` or `.djfp` store file; a missing file yields an empty store
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("Store {} does not exist yet, starting empty", path.display());
            return Ok(Self::new());
        }
        Self::from_store_file(&djset_fp::load_auto(path)?)
    }

    /// Save as `.json` or `.djfp` depending on the extension
    pub fn save(&self, path: &Path) -> Result<()> {
        djset_fp::save_auto(path, &self.to_store_file())?;
        Ok(())
    }
}

fn record_from_stored(track_id: &str, entry: &StoredTrack) -> FingerprintRecord {
    FingerprintRecord::new(
        track_id,
        entry.title.clone().unwrap_or_else(|| track_id.to_string()),
        entry.artist.clone().unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        entry.hashes.iter().map(|h| Fingerprint::new(h.as_str())),
    )
}
