//! Track-transition detection over the chroma flux signal
//!
//! 1. Flux: L1 distance between consecutive frames.
//! 2. Centred moving average over `smoothing_window` frames.
//! 3. Local maxima above `threshold * mean(flux)` inside `(0, T)`.
//! 4. Non-maximum suppression within `min_segment_length_s`.
//! 5. Optional cap to the `max_segments - 1` strongest peaks.

use crate::config::BoundaryConfig;
use crate::features::FeatureFrame;
use std::cmp::Ordering;

/// A hypothesised track change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    /// Timestamp in seconds, strictly inside the recording
    pub time_s: f64,
    /// Smoothed flux value at the peak
    pub magnitude: f64,
}

impl Boundary {
    pub fn new(time_s: f64, magnitude: f64) -> Self {
        Self { time_s, magnitude }
    }

    /// Boundary with no associated peak strength
    pub fn at(time_s: f64) -> Self {
        Self::new(time_s, 0.0)
    }
}

/// One sample of the flux signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxPoint {
    pub time_s: f64,
    pub value: f64,
}

pub struct BoundaryDetector {
    smoothing_window: usize,
    threshold: f64,
    min_separation_s: f64,
    max_segments: Option<usize>,
}

impl BoundaryDetector {
    pub fn new(config: &BoundaryConfig) -> Self {
        Self {
            smoothing_window: config.smoothing_window.max(1),
            threshold: config.threshold,
            min_separation_s: config.min_segment_length_s,
            max_segments: config.max_segments,
        }
    }

    /// Detect boundaries in a frame sequence covering `duration_s` seconds.
    ///
    /// Output is sorted ascending and strictly inside `(0, duration_s)`.
    pub fn detect<I>(&self, frames: I, duration_s: f64) -> Vec<Boundary>
    where
        I: IntoIterator<Item = FeatureFrame>,
    {
        let flux = compute_flux(frames);
        let smoothed = smooth(&flux, self.smoothing_window);
        self.pick_peaks(&smoothed, duration_s)
    }

    /// Peak picking over an already smoothed flux signal
    pub fn pick_peaks(&self, flux: &[FluxPoint], duration_s: f64) -> Vec<Boundary> {
        if flux.is_empty() {
            return Vec::new();
        }

        let mean = flux.iter().map(|p| p.value).sum::<f64>() / flux.len() as f64;
        let floor = self.threshold * mean;

        let mut candidates: Vec<Boundary> = local_maxima(flux)
            .filter(|p| p.value > floor)
            .filter(|p| p.time_s > 0.0 && p.time_s < duration_s)
            .map(|p| Boundary::new(p.time_s, p.value))
            .collect();

        log::debug!(
            "Flux: {} points, mean {:.4}, floor {:.4}, {} raw peaks",
            flux.len(),
            mean,
            floor,
            candidates.len()
        );

        candidates.sort_by(by_strength);

        let mut accepted: Vec<Boundary> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let too_close = accepted
                .iter()
                .any(|b| (b.time_s - candidate.time_s).abs() < self.min_separation_s);
            if too_close {
                log::trace!(
                    "Suppressed peak at {:.2}s ({:.4}): within {:.1}s of a stronger peak",
                    candidate.time_s,
                    candidate.magnitude,
                    self.min_separation_s
                );
                continue;
            }
            accepted.push(candidate);
        }

        // `accepted` is still ordered by strength, so the cap keeps the strongest
        if let Some(max_segments) = self.max_segments {
            let limit = max_segments.saturating_sub(1);
            if accepted.len() > limit {
                log::debug!(
                    "Capping {} boundaries to {} (max_segments = {})",
                    accepted.len(),
                    limit,
                    max_segments
                );
                accepted.truncate(limit);
            }
        }

        accepted.sort_by(|a, b| a.time_s.total_cmp(&b.time_s));
        accepted
    }
}

/// Stronger first; exact ties go to the earlier timestamp
fn by_strength(a: &Boundary, b: &Boundary) -> Ordering {
    b.magnitude
        .total_cmp(&a.magnitude)
        .then_with(|| a.time_s.total_cmp(&b.time_s))
}

/// Frame-to-frame L1 change, stamped halfway between the two frame centres
pub fn compute_flux<I>(frames: I) -> Vec<FluxPoint>
where
    I: IntoIterator<Item = FeatureFrame>,
{
    let mut flux = Vec::new();
    let mut previous: Option<FeatureFrame> = None;

    for frame in frames {
        if let Some(prev) = &previous {
            flux.push(FluxPoint {
                time_s: (prev.time_s + frame.time_s) / 2.0,
                value: prev.l1_distance(&frame),
            });
        }
        previous = Some(frame);
    }

    flux
}

/// Centred moving average, window truncated at the edges.
///
/// The window spans `window / 2` points on each side, so an even width
/// behaves like the next odd one.
pub fn smooth(flux: &[FluxPoint], window: usize) -> Vec<FluxPoint> {
    if window <= 1 {
        return flux.to_vec();
    }

    let half = window / 2;
    let len = flux.len();
    (0..len)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(len);
            let sum: f64 = flux[start..end].iter().map(|p| p.value).sum();
            FluxPoint {
                time_s: flux[i].time_s,
                value: sum / (end - start) as f64,
            }
        })
        .collect()
}

/// Points rising strictly from the left and not falling to the right.
/// Missing neighbours count as negative infinity.
fn local_maxima(flux: &[FluxPoint]) -> impl Iterator<Item = FluxPoint> + '_ {
    (0..flux.len()).filter_map(move |i| {
        let value = flux[i].value;
        let left = if i > 0 { flux[i - 1].value } else { f64::NEG_INFINITY };
        let right = flux.get(i + 1).map_or(f64::NEG_INFINITY, |p| p.value);
        (value > left && value >= right).then_some(flux[i])
    })
}
