//! Per-segment fingerprint matching

use crate::audio::SampleStream;
use crate::config::MatchingConfig;
use crate::fingerprint::Fingerprinter;
use crate::playlist::Match;
use crate::segmentation::Segment;
use crate::store::FingerprintStore;

/// Resolves segments against a store. Holds no per-run state, so one
/// matcher serves any number of segments concurrently.
pub struct SegmentMatcher<'a> {
    fingerprinter: &'a dyn Fingerprinter,
    min_confidence: f64,
    min_samples: usize,
}

impl<'a> SegmentMatcher<'a> {
    pub fn new(fingerprinter: &'a dyn Fingerprinter, config: &MatchingConfig) -> Self {
        Self {
            fingerprinter,
            min_confidence: config.min_confidence,
            min_samples: config.min_fingerprint_samples,
        }
    }

    /// Identify one segment of `stream`.
    ///
    /// Weak matches are reported as unidentified rather than as a guess. A
    /// zero score never identifies, whatever `min_confidence` is.
    pub fn match_segment(
        &self,
        segment: Segment,
        stream: &SampleStream,
        store: &FingerprintStore,
    ) -> Match {
        let samples = stream.slice_seconds(segment.start, segment.end);
        if samples.len() < self.min_samples {
            log::trace!(
                "Segment {:.2}-{:.2}s has {} samples (< {}), not fingerprinting",
                segment.start,
                segment.end,
                samples.len(),
                self.min_samples
            );
            return Match::unidentified(segment);
        }

        let fingerprint = self.fingerprinter.fingerprint(samples, stream.sample_rate());

        let Some((record, distance)) = store.find_best(&fingerprint) else {
            log::debug!(
                "Segment {:.2}-{:.2}s [{}]: store has no candidates",
                segment.start,
                segment.end,
                fingerprint
            );
            return Match::unidentified(segment);
        };

        let confidence = (1.0 - distance).clamp(0.0, 1.0);
        if confidence <= 0.0 || confidence < self.min_confidence {
            log::debug!(
                "Segment {:.2}-{:.2}s [{}]: best {} at {:.3} below {:.3}",
                segment.start,
                segment.end,
                fingerprint,
                record.track_id,
                confidence,
                self.min_confidence
            );
            return Match::unidentified(segment);
        }

        log::debug!(
            "Segment {:.2}-{:.2}s [{}]: {} ({:.3})",
            segment.start,
            segment.end,
            fingerprint,
            record.track_id,
            confidence
        );
        Match::identified(segment, record, confidence)
    }
}
