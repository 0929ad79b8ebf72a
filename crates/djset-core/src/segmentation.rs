//! Splitting a recording into contiguous segments at detected boundaries

use crate::boundary::Boundary;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A time interval hypothesised to hold one track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Split `[0, duration_s]` at the given boundaries.
///
/// Exact duplicate timestamps are collapsed. Anything else out of order or
/// outside `(0, duration_s)` is a detector bug and is rejected.
pub fn split(boundaries: &[Boundary], duration_s: f64) -> Result<Vec<Segment>> {
    if !(duration_s.is_finite() && duration_s > 0.0) {
        return Err(Error::invalid_input(format!(
            "recording duration must be finite and positive, got {}",
            duration_s
        )));
    }

    let mut cuts: Vec<f64> = boundaries.iter().map(|b| b.time_s).collect();
    cuts.dedup();

    for (i, &t) in cuts.iter().enumerate() {
        if !(t > 0.0 && t < duration_s) {
            return Err(Error::invalid_input(format!(
                "boundary {} at {}s lies outside (0, {})",
                i, t, duration_s
            )));
        }
        if i > 0 && t <= cuts[i - 1] {
            return Err(Error::invalid_input(format!(
                "boundaries not strictly increasing: {}s follows {}s",
                t,
                cuts[i - 1]
            )));
        }
    }

    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0.0;
    for &cut in &cuts {
        segments.push(Segment::new(start, cut));
        start = cut;
    }
    segments.push(Segment::new(start, duration_s));

    Ok(segments)
}

/// Check that `segments` partition `[0, duration_s]` exactly
pub fn is_partition(segments: &[Segment], duration_s: f64) -> bool {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return false;
    };
    first.start == 0.0
        && last.end == duration_s
        && segments.iter().all(|s| s.start < s.end)
        && segments.windows(2).all(|w| w[0].end == w[1].start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(times: &[f64]) -> Vec<Boundary> {
        times.iter().map(|&t| Boundary::at(t)).collect()
    }

    #[test]
    fn test_no_boundaries_single_segment() {
        let segments = split(&[], 95.5).unwrap();
        assert_eq!(segments, vec![Segment::new(0.0, 95.5)]);
    }

    #[test]
    fn test_segments_partition_recording() {
        let segments = split(&at(&[30.0, 61.0, 100.0]), 180.0).unwrap();
        assert_eq!(segments.len(), 4);
        assert!(is_partition(&segments, 180.0));
        assert_eq!(segments[1], Segment::new(30.0, 61.0));
    }

    #[test]
    fn test_duplicates_collapse() {
        let segments = split(&at(&[30.0, 30.0, 60.0]), 90.0).unwrap();
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(split(&at(&[0.0]), 10.0), Err(Error::InvalidInput(_))));
        assert!(matches!(split(&at(&[10.0]), 10.0), Err(Error::InvalidInput(_))));
        assert!(matches!(split(&at(&[f64::NAN]), 10.0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_unsorted() {
        assert!(matches!(split(&at(&[6.0, 3.0]), 10.0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_bad_duration() {
        assert!(split(&[], 0.0).is_err());
        assert!(split(&[], f64::INFINITY).is_err());
    }
}
