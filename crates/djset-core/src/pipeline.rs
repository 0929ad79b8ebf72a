//! End-to-end identification: features → boundaries → segments → matches →
//! playlist.

use crate::audio::{Decoder, SampleStream};
use crate::boundary::BoundaryDetector;
use crate::config::DjSetConfig;
use crate::consolidation::Consolidator;
use crate::features::FeatureExtractor;
use crate::fingerprint::{ChromaFingerprinter, Fingerprinter};
use crate::matching::SegmentMatcher;
use crate::playlist::{Match, Playlist};
use crate::segmentation::{self, Segment};
use crate::store::FingerprintStore;
use crate::{Error, Result};
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation flag shared between a run and its caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Identification pipeline with its matching pool
pub struct Pipeline<F: Fingerprinter = ChromaFingerprinter> {
    config: DjSetConfig,
    fingerprinter: F,
    pool: rayon::ThreadPool,
}

impl Pipeline<ChromaFingerprinter> {
    /// Pipeline using the bundled chroma fingerprinter
    pub fn new(config: DjSetConfig) -> Result<Self> {
        let fingerprinter = ChromaFingerprinter::new(config.features.clone());
        Self::with_fingerprinter(config, fingerprinter)
    }
}

impl<F: Fingerprinter> Pipeline<F> {
    pub fn with_fingerprinter(config: DjSetConfig, fingerprinter: F) -> Result<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.matching.worker_threads)
            .thread_name(|i| format!("djset-match-{}", i))
            .build()
            .map_err(|e| Error::Config(format!("failed to build matching pool: {}", e)))?;

        Ok(Self {
            config,
            fingerprinter,
            pool,
        })
    }

    pub fn config(&self) -> &DjSetConfig {
        &self.config
    }

    pub fn fingerprinter(&self) -> &F {
        &self.fingerprinter
    }

    /// Identify the tracks of one recording.
    ///
    /// Returns a playlist covering `[0, T]` or a single error; a cancelled
    /// run returns `Error::Cancelled` and nothing else.
    pub fn run(
        &self,
        stream: &SampleStream,
        store: &FingerprintStore,
        cancel: &CancellationToken,
    ) -> Result<Playlist> {
        if stream.sample_rate() == 0 {
            return Err(Error::invalid_input("sample stream has a sample rate of 0"));
        }
        if stream.is_empty() {
            return Err(Error::invalid_input("sample stream is empty"));
        }
        if stream.sample_rate() != self.config.sample_rate {
            log::debug!(
                "Stream rate {}Hz differs from configured {}Hz; using the stream rate",
                stream.sample_rate(),
                self.config.sample_rate
            );
        }

        let started = Instant::now();
        let duration_s = stream.duration_s();
        cancel.check()?;

        let segments = self.segment(stream)?;
        cancel.check()?;

        let matches = self.match_segments(&segments, stream, store, cancel)?;
        let consolidated = Consolidator::new(&self.config.consolidation).consolidate(matches);

        let spans: Vec<Segment> = consolidated.iter().map(|m| m.segment).collect();
        if !segmentation::is_partition(&spans, duration_s) {
            return Err(Error::invalid_input(
                "consolidated playlist does not partition the recording",
            ));
        }

        let playlist = Playlist::new(consolidated);
        log::info!(
            "Identified {} of {} playlist entries over {:.1}s of audio in {:.2}s",
            playlist.identified_count(),
            playlist.len(),
            duration_s,
            started.elapsed().as_secs_f64()
        );
        Ok(playlist)
    }

    /// Decode `path` and run on the result
    pub fn run_file(
        &self,
        decoder: &dyn Decoder,
        path: &Path,
        store: &FingerprintStore,
        cancel: &CancellationToken,
    ) -> Result<Playlist> {
        let stream = decoder.decode(path)?;
        log::info!(
            "Decoded {}: {:.1}s @ {}Hz",
            path.display(),
            stream.duration_s(),
            stream.sample_rate()
        );
        self.run(&stream, store, cancel)
    }

    /// Sequential stages: features, boundaries, segments
    pub fn segment(&self, stream: &SampleStream) -> Result<Vec<Segment>> {
        let duration_s = stream.duration_s();
        let extractor = FeatureExtractor::new(&self.config.features, stream.sample_rate());
        let boundaries = BoundaryDetector::new(&self.config.boundaries)
            .detect(extractor.frames(stream), duration_s);

        log::debug!(
            "Detected {} boundaries: {:?}",
            boundaries.len(),
            boundaries.iter().map(|b| b.time_s).collect::<Vec<_>>()
        );

        segmentation::split(&boundaries, duration_s)
    }

    /// Match every segment on the pool; results are re-ordered by segment index
    fn match_segments(
        &self,
        segments: &[Segment],
        stream: &SampleStream,
        store: &FingerprintStore,
        cancel: &CancellationToken,
    ) -> Result<Vec<Match>> {
        let matcher = SegmentMatcher::new(&self.fingerprinter, &self.config.matching);

        let mut keyed: Vec<(usize, Match)> = self.pool.install(|| {
            segments
                .par_iter()
                .enumerate()
                .map(|(index, segment)| {
                    cancel.check()?;
                    Ok((index, matcher.match_segment(*segment, stream, store)))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        cancel.check()?;

        keyed.sort_by_key(|(index, _)| *index);
        Ok(keyed.into_iter().map(|(_, m)| m).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_before_run() {
        let pipeline = Pipeline::new(DjSetConfig::default()).unwrap();
        let stream = SampleStream::new(vec![0.0f32; 44_100], 44_100);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = pipeline.run(&stream, &FingerprintStore::new(), &cancel);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_empty_stream_rejected() {
        let pipeline = Pipeline::new(DjSetConfig::default()).unwrap();
        let stream = SampleStream::new(Vec::<f32>::new(), 44_100);
        let result = pipeline.run(&stream, &FingerprintStore::new(), &CancellationToken::new());
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = DjSetConfig::default();
        config.features.hop_size = 0;
        assert!(matches!(Pipeline::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
