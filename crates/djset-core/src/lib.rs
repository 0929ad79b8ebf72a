//! djset core - DJ set segmentation and track identification
//!
//! A long mixed recording is cut at detected track transitions, each piece
//! is fingerprinted and looked up in a fingerprint store, and the results
//! are consolidated into a gap-free playlist.

pub mod audio;
pub mod boundary;
pub mod config;
pub mod consolidation;
pub mod error;
pub mod features;
pub mod fingerprint;
pub mod matching;
pub mod pipeline;
pub mod playlist;
pub mod segmentation;
pub mod store;

pub use audio::{Decoder, FileDecoder, SampleStream};
pub use boundary::{Boundary, BoundaryDetector};
pub use config::DjSetConfig;
pub use consolidation::Consolidator;
pub use error::{Error, Result};
pub use features::{FeatureExtractor, FeatureFrame};
pub use fingerprint::{ChromaFingerprinter, Fingerprint, Fingerprinter};
pub use matching::SegmentMatcher;
pub use pipeline::{CancellationToken, Pipeline};
pub use playlist::{Match, Playlist};
pub use segmentation::{split, Segment};
pub use store::{BootstrapReport, DuplicatePolicy, FingerprintRecord, FingerprintStore};

use std::path::Path;

/// Identify the tracks of an audio file with the bundled decoder and
/// fingerprinter
pub fn identify_file(
    audio_path: &Path,
    store: &FingerprintStore,
    config: &DjSetConfig,
) -> Result<Playlist> {
    let decoder = FileDecoder::new(config.sample_rate);
    let pipeline = Pipeline::new(config.clone())?;
    pipeline.run_file(&decoder, audio_path, store, &CancellationToken::new())
}
