//! Configuration for the identification pipeline
//!
//! Every stage reads its own section. All sections default, so a TOML file
//! only needs the values it overrides.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DjSetConfig {
    /// Rate the decoder resamples to; all stage timings derive from it
    pub sample_rate: u32,
    pub features: FeatureConfig,
    pub boundaries: BoundaryConfig,
    pub matching: MatchingConfig,
    pub consolidation: ConsolidationConfig,
    pub store: StoreConfig,
}

/// Spectral feature extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Analysis window in samples (FFT size)
    pub window_size: usize,
    /// Frame spacing in samples
    pub hop_size: usize,
    /// Lowest frequency folded into the chroma bins (Hz)
    pub min_freq: f32,
    /// Highest frequency folded into the chroma bins (Hz)
    pub max_freq: f32,
}

/// Boundary detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Moving-average length over the flux signal, in frames (1 = off).
    /// The average is centred, so even values round up to the next odd width.
    pub smoothing_window: usize,
    /// Peaks must exceed `threshold * mean(flux)`
    pub threshold: f64,
    /// Minimum distance between two boundaries (seconds)
    pub min_segment_length_s: f64,
    /// Upper bound on the number of segments
    pub max_segments: Option<usize>,
}

/// Per-segment fingerprint matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Matches below this confidence are reported as unidentified
    pub min_confidence: f64,
    /// Segments with fewer samples are not fingerprinted
    pub min_fingerprint_samples: usize,
    /// Matching pool size; 0 uses one thread per CPU
    pub worker_threads: usize,
}

/// Playlist consolidation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Unidentified fragments shorter than this are absorbed by a neighbour
    pub min_track_length_s: f64,
}

/// Store locations used by the front ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: PathBuf,
    pub bootstrap: Option<PathBuf>,
}

impl Default for DjSetConfig {
    fn default() -> Self {
        Self {
            sample_rate: crate::audio::DEFAULT_SAMPLE_RATE,
            features: FeatureConfig::default(),
            boundaries: BoundaryConfig::default(),
            matching: MatchingConfig::default(),
            consolidation: ConsolidationConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_size: 8192,
            hop_size: 4410, // 100 ms at 44.1 kHz
            min_freq: 55.0,
            max_freq: 5000.0,
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 5,
            threshold: 1.5,
            min_segment_length_s: 30.0,
            max_segments: None,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.85,
            min_fingerprint_samples: 2048,
            worker_threads: 0,
        }
    }
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            min_track_length_s: 10.0,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("fingerprints.json"),
            bootstrap: None,
        }
    }
}

impl DjSetConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DjSetConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(config_error("sample_rate must be > 0"));
        }

        let f = &self.features;
        if f.window_size == 0 || f.hop_size == 0 {
            return Err(config_error("window_size and hop_size must be > 0"));
        }
        if f.hop_size > f.window_size {
            return Err(config_error("hop_size must not exceed window_size"));
        }
        if !(f.min_freq > 0.0 && f.min_freq < f.max_freq) {
            return Err(config_error("min_freq must be > 0 and < max_freq"));
        }
        if f.max_freq > self.sample_rate as f32 / 2.0 {
            return Err(config_error("max_freq must not exceed the Nyquist frequency"));
        }

        let b = &self.boundaries;
        if b.smoothing_window == 0 {
            return Err(config_error("smoothing_window must be >= 1"));
        }
        if !(b.threshold >= 0.0) {
            return Err(config_error("threshold must be >= 0"));
        }
        if !(b.min_segment_length_s >= 0.0) {
            return Err(config_error("min_segment_length_s must be >= 0"));
        }
        if b.max_segments == Some(0) {
            return Err(config_error("max_segments must be >= 1"));
        }

        let m = &self.matching;
        if !(0.0..=1.0).contains(&m.min_confidence) {
            return Err(config_error("min_confidence must lie in [0, 1]"));
        }

        if !(self.consolidation.min_track_length_s >= 0.0) {
            return Err(config_error("min_track_length_s must be >= 0"));
        }

        Ok(())
    }
}

fn config_error(msg: &str) -> Error {
    Error::Config(msg.to_string())
}
