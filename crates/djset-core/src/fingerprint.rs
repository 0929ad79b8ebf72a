//! Fingerprint values and the fingerprint collaborator
//!
//! The pipeline treats fingerprints as opaque strings. The bundled
//! [`ChromaFingerprinter`] produces 64-bit comparison hashes rendered as hex,
//! so that similar audio lands a small Hamming distance apart.

use crate::config::FeatureConfig;
use crate::features::{FeatureExtractor, CHROMA_BINS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque fingerprint value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 64-bit hash rendered as 16 lowercase hex digits
    pub fn from_bits(bits: u64) -> Self {
        Self(format!("{:016x}", bits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalised distance in `[0, 1]`.
    ///
    /// Identical values are 0 apart. Hex strings of equal length compare by
    /// the fraction of differing bits. Anything else is maximally distant.
    pub fn distance(&self, other: &Fingerprint) -> f64 {
        if self.0 == other.0 {
            return 0.0;
        }
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 1.0;
        }

        let mut differing = 0u32;
        for (a, b) in self.0.chars().zip(other.0.chars()) {
            match (a.to_digit(16), b.to_digit(16)) {
                (Some(x), Some(y)) => differing += (x ^ y).count_ones(),
                _ => return 1.0,
            }
        }
        differing as f64 / (self.0.len() * 4) as f64
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Fingerprint collaborator: must be pure and deterministic.
pub trait Fingerprinter: Send + Sync {
    fn fingerprint(&self, samples: &[f32], sample_rate: u32) -> Fingerprint;
}

/// Default fingerprinter: pooled pitch-class profile of the slice encoded as
/// pairwise comparison bits.
#[derive(Debug, Clone, Default)]
pub struct ChromaFingerprinter {
    features: FeatureConfig,
}

impl ChromaFingerprinter {
    pub fn new(features: FeatureConfig) -> Self {
        Self { features }
    }

    /// Mean chroma over every frame of the slice
    pub fn pooled_chroma(&self, samples: &[f32], sample_rate: u32) -> [f32; CHROMA_BINS] {
        let extractor = FeatureExtractor::new(&self.features, sample_rate);
        let mut pooled = [0.0f32; CHROMA_BINS];
        let mut count = 0usize;

        for frame in extractor.frames_for(samples) {
            for (acc, value) in pooled.iter_mut().zip(frame.chroma.iter()) {
                *acc += value;
            }
            count += 1;
        }

        if count > 0 {
            pooled.iter_mut().for_each(|v| *v /= count as f32);
        }
        pooled
    }
}

impl Fingerprinter for ChromaFingerprinter {
    fn fingerprint(&self, samples: &[f32], sample_rate: u32) -> Fingerprint {
        Fingerprint::from_bits(comparison_hash(&self.pooled_chroma(samples, sample_rate)))
    }
}

/// Bit k is set when pitch class i outweighs pitch class j, for the first 64
/// of the 66 ordered pairs (i < j).
fn comparison_hash(profile: &[f32; CHROMA_BINS]) -> u64 {
    let mut hash = 0u64;
    let mut bit = 0;

    'pairs: for i in 0..CHROMA_BINS {
        for j in (i + 1)..CHROMA_BINS {
            if bit == 64 {
                break 'pairs;
            }
            if profile[i] > profile[j] {
                hash |= 1 << bit;
            }
            bit += 1;
        }
    }

    hash
}
