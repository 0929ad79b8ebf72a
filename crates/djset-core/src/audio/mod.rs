//! Audio input: the mono sample stream consumed by the pipeline and the
//! decoder collaborator that produces it.
//!
//! Supports WAV, MP3, FLAC, OGG and audio tracks inside MP4/MKV/MOV/WebM
//! containers using pure Rust decoders.

mod container;
mod decoder;
mod resample;

pub use decoder::{DecodedAudio, FileDecoder};
pub use resample::resample_to_target;

use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Reference decode rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Immutable mono PCM at a fixed sample rate.
///
/// Cloning is cheap: the sample buffer is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStream {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl SampleStream {
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total duration `T` in seconds
    pub fn duration_s(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples covering `[start_s, end_s)`, clamped to the stream
    pub fn slice_seconds(&self, start_s: f64, end_s: f64) -> &[f32] {
        let rate = self.sample_rate as f64;
        let len = self.samples.len();
        let start = ((start_s.max(0.0) * rate).floor() as usize).min(len);
        let end = ((end_s.max(0.0) * rate).floor() as usize).clamp(start, len);
        &self.samples[start..end]
    }
}

/// Decoder collaborator: turns a file into a mono sample stream.
pub trait Decoder: Send + Sync {
    /// Decode `path`; failures are reported as `Error::Decode` carrying the path.
    fn decode(&self, path: &Path) -> Result<SampleStream>;
}

/// Supported audio and container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,

    // Containers, audio track extracted with Symphonia
    Mp4,
    Mkv,
    Mov,
    Webm,

    Unknown,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("wav") | Some("wave") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            Some("flac") => AudioFormat::Flac,
            Some("ogg") => AudioFormat::Ogg,
            Some("mp4") | Some("m4a") | Some("m4v") => AudioFormat::Mp4,
            Some("mkv") | Some("mka") => AudioFormat::Mkv,
            Some("mov") => AudioFormat::Mov,
            Some("webm") => AudioFormat::Webm,
            _ => AudioFormat::Unknown,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            AudioFormat::Mp4 | AudioFormat::Mkv | AudioFormat::Mov | AudioFormat::Webm
        )
    }
}
