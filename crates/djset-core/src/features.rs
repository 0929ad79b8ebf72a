//! Chroma feature extraction
//!
//! FFT with a Hann window, magnitude bins folded onto the 12 pitch classes
//! and normalised into an energy distribution per frame.

use crate::audio::SampleStream;
use crate::config::FeatureConfig;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Number of pitch classes per frame
pub const CHROMA_BINS: usize = 12;

/// Spectral content of one analysis window
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    /// Centre of the analysis window (seconds)
    pub time_s: f64,
    /// Pitch-class energy distribution; sums to 1, or all zero for silence
    pub chroma: [f32; CHROMA_BINS],
}

impl FeatureFrame {
    pub fn new(time_s: f64, chroma: [f32; CHROMA_BINS]) -> Self {
        Self { time_s, chroma }
    }

    /// L1 distance between two frames
    pub fn l1_distance(&self, other: &FeatureFrame) -> f64 {
        self.chroma
            .iter()
            .zip(other.chroma.iter())
            .map(|(a, b)| (a - b).abs() as f64)
            .sum()
    }
}

/// Computes chroma frames for sample buffers at a fixed rate
#[derive(Clone)]
pub struct FeatureExtractor {
    window_size: usize,
    hop_size: usize,
    sample_rate: u32,
    fft: Arc<dyn Fft<f32>>,
    window: Arc<[f32]>,
    /// Pitch class for each FFT bin below Nyquist, `None` outside the band
    pitch_class: Arc<[Option<u8>]>,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig, sample_rate: u32) -> Self {
        let window_size = config.window_size.max(1);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window_size);

        Self {
            window_size,
            hop_size: config.hop_size.max(1),
            sample_rate,
            fft,
            window: create_hann_window(window_size).into(),
            pitch_class: pitch_class_map(config, window_size, sample_rate).into(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames produced for `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        if len <= self.window_size {
            1
        } else {
            1 + (len - self.window_size).div_ceil(self.hop_size)
        }
    }

    /// Lazy frame sequence over a stream; clone the iterator to restart it
    pub fn frames<'a>(&'a self, stream: &'a SampleStream) -> FeatureFrames<'a> {
        self.frames_for(stream.samples())
    }

    /// Lazy frame sequence over a raw buffer at the extractor's rate
    pub fn frames_for<'a>(&'a self, samples: &'a [f32]) -> FeatureFrames<'a> {
        FeatureFrames {
            extractor: self,
            samples,
            next: 0,
            count: self.frame_count(samples.len()),
        }
    }

    fn compute_frame(&self, samples: &[f32], index: usize) -> FeatureFrame {
        let start = index * self.hop_size;
        let end = (start + self.window_size).min(samples.len());
        let available = samples.get(start..end).unwrap_or(&[]);

        let mut buffer: Vec<Complex<f32>> = available
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        buffer.resize(self.window_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        let mut chroma = [0.0f32; CHROMA_BINS];
        for (bin, class) in self.pitch_class.iter().enumerate() {
            if let Some(class) = class {
                chroma[*class as usize] += buffer[bin].norm_sqr();
            }
        }

        let total: f32 = chroma.iter().sum();
        if total > f32::EPSILON {
            chroma.iter_mut().for_each(|c| *c /= total);
        } else {
            chroma = [0.0; CHROMA_BINS];
        }

        let centre = start as f64 + self.window_size as f64 / 2.0;
        FeatureFrame::new(centre / self.sample_rate as f64, chroma)
    }
}

/// Iterator over the frames of one buffer
#[derive(Clone)]
pub struct FeatureFrames<'a> {
    extractor: &'a FeatureExtractor,
    samples: &'a [f32],
    next: usize,
    count: usize,
}

impl Iterator for FeatureFrames<'_> {
    type Item = FeatureFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let frame = self.extractor.compute_frame(self.samples, self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FeatureFrames<'_> {}

/// Create Hann window
fn create_hann_window(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    (0..size)
        .map(|i| {
            let x = i as f32 / (size - 1) as f32;
            0.5 * (1.0 - (2.0 * PI * x).cos())
        })
        .collect()
}

/// Map FFT bins to pitch classes (C = 0)
fn pitch_class_map(config: &FeatureConfig, window_size: usize, sample_rate: u32) -> Vec<Option<u8>> {
    let bin_hz = sample_rate as f32 / window_size as f32;
    (0..window_size / 2)
        .map(|bin| {
            let freq = bin as f32 * bin_hz;
            if bin == 0 || freq < config.min_freq || freq > config.max_freq {
                return None;
            }
            let midi = 69.0 + 12.0 * (freq / 440.0).log2();
            Some((midi.round() as i32).rem_euclid(12) as u8)
        })
        .collect()
}
