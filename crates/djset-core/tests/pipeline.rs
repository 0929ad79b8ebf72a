//! End-to-end pipeline tests on synthetic sets

use approx::assert_relative_eq;
use djset_core::config::{BoundaryConfig, FeatureConfig};
use djset_core::features::{FeatureFrame, CHROMA_BINS};
use djset_core::segmentation::is_partition;
use djset_core::{
    split, BoundaryDetector, CancellationToken, ChromaFingerprinter, DjSetConfig, Error,
    Fingerprint, FingerprintRecord, FingerprintStore, Fingerprinter, Pipeline, SampleStream,
    Segment,
};
use std::f32::consts::PI;

const SAMPLE_RATE: u32 = 8000;

/// Names a slice by its dominant pitch class
struct DominantPitchFingerprinter {
    inner: ChromaFingerprinter,
}

impl Fingerprinter for DominantPitchFingerprinter {
    fn fingerprint(&self, samples: &[f32], sample_rate: u32) -> Fingerprint {
        let pooled = self.inner.pooled_chroma(samples, sample_rate);
        let mut best = 0;
        for (i, &v) in pooled.iter().enumerate() {
            if v > pooled[best] {
                best = i;
            }
        }
        Fingerprint::new(format!("pc-{}", best))
    }
}

/// Cancels the shared token the first time it is asked for a fingerprint
struct CancellingFingerprinter {
    token: CancellationToken,
}

impl Fingerprinter for CancellingFingerprinter {
    fn fingerprint(&self, _samples: &[f32], _sample_rate: u32) -> Fingerprint {
        self.token.cancel();
        Fingerprint::new("00")
    }
}

fn config() -> DjSetConfig {
    let mut config = DjSetConfig::default();
    config.sample_rate = SAMPLE_RATE;
    config.features = FeatureConfig {
        window_size: 2048,
        hop_size: 800,
        min_freq: 55.0,
        max_freq: 3500.0,
    };
    config.boundaries.smoothing_window = 5;
    config.boundaries.threshold = 3.0;
    config.boundaries.min_segment_length_s = 10.0;
    config.consolidation.min_track_length_s = 5.0;
    config.matching.worker_threads = 2;
    config
}

fn tone(freq: f32, seconds: f32) -> Vec<f32> {
    let n = (seconds * SAMPLE_RATE as f32) as usize;
    (0..n)
        .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

/// A4, then C4, then E4, 40 seconds each
fn three_track_set() -> SampleStream {
    let mut samples = tone(440.0, 40.0);
    samples.extend(tone(261.63, 40.0));
    samples.extend(tone(329.63, 40.0));
    SampleStream::new(samples, SAMPLE_RATE)
}

fn record(track_id: &str, hash: &str) -> FingerprintRecord {
    FingerprintRecord::new(track_id, track_id, "Synth", [Fingerprint::new(hash)])
}

fn pitch_store() -> FingerprintStore {
    let mut store = FingerprintStore::new();
    store.add(record("track-a", "pc-9"), false).unwrap();
    store.add(record("track-c", "pc-0"), false).unwrap();
    store.add(record("track-e", "pc-4"), false).unwrap();
    store
}

fn pitch_pipeline() -> Pipeline<DominantPitchFingerprinter> {
    let config = config();
    let fingerprinter = DominantPitchFingerprinter {
        inner: ChromaFingerprinter::new(config.features.clone()),
    };
    Pipeline::with_fingerprinter(config, fingerprinter).unwrap()
}

fn spans(playlist: &djset_core::Playlist) -> Vec<Segment> {
    playlist.matches().iter().map(|m| m.segment).collect()
}

#[test]
fn test_identifies_three_tracks_in_order() {
    let stream = three_track_set();
    let playlist = pitch_pipeline()
        .run(&stream, &pitch_store(), &CancellationToken::new())
        .unwrap();

    let ids: Vec<_> = playlist
        .matches()
        .iter()
        .map(|m| m.track_id.as_deref())
        .collect();
    assert_eq!(ids, vec![Some("track-a"), Some("track-c"), Some("track-e")]);

    let matches = playlist.matches();
    assert!((matches[0].end() - 40.0).abs() < 0.5, "first cut at {}", matches[0].end());
    assert!((matches[1].end() - 80.0).abs() < 0.5, "second cut at {}", matches[1].end());
    for m in matches {
        assert_relative_eq!(m.confidence, 1.0);
    }
    assert!(is_partition(&spans(&playlist), stream.duration_s()));
}

#[test]
fn test_unknown_audio_is_one_unidentified_entry() {
    let stream = three_track_set();
    let mut store = FingerprintStore::new();
    store.add(record("track-b", "pc-11"), false).unwrap();

    let playlist = pitch_pipeline()
        .run(&stream, &store, &CancellationToken::new())
        .unwrap();

    assert_eq!(playlist.len(), 1);
    let only = &playlist.matches()[0];
    assert!(only.track_id.is_none());
    assert_eq!(only.confidence, 0.0);
    assert_eq!(only.segment, Segment::new(0.0, stream.duration_s()));
}

#[test]
fn test_default_fingerprinter_with_empty_store() {
    let stream = three_track_set();
    let pipeline = Pipeline::new(config()).unwrap();
    let playlist = pipeline
        .run(&stream, &FingerprintStore::new(), &CancellationToken::new())
        .unwrap();

    assert_eq!(playlist.len(), 1);
    assert_eq!(playlist.identified_count(), 0);
    assert!(is_partition(&spans(&playlist), stream.duration_s()));
}

#[test]
fn test_runs_are_deterministic() {
    let stream = three_track_set();
    let config = config();
    let fingerprinter = ChromaFingerprinter::new(config.features.clone());

    let mut store = FingerprintStore::new();
    for (id, freq) in [("track-a", 440.0), ("track-c", 261.63), ("track-e", 329.63)] {
        let hash = fingerprinter.fingerprint(&tone(freq, 40.0), SAMPLE_RATE);
        store
            .add(FingerprintRecord::new(id, id, "Synth", [hash]), false)
            .unwrap();
    }

    let pipeline = Pipeline::new(config).unwrap();
    let first = pipeline
        .run(&stream, &store, &CancellationToken::new())
        .unwrap();
    let second = pipeline
        .run(&stream, &store, &CancellationToken::new())
        .unwrap();

    assert_eq!(first.to_json_pretty().unwrap(), second.to_json_pretty().unwrap());
    assert!(is_partition(&spans(&first), stream.duration_s()));
}

#[test]
fn test_cancellation_mid_matching() {
    let stream = three_track_set();
    let token = CancellationToken::new();
    let pipeline = Pipeline::with_fingerprinter(
        config(),
        CancellingFingerprinter {
            token: token.clone(),
        },
    )
    .unwrap();

    let result = pipeline.run(&stream, &pitch_store(), &token);
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_single_short_recording() {
    // shorter than one analysis window
    let stream = SampleStream::new(tone(440.0, 0.1), SAMPLE_RATE);
    let playlist = pitch_pipeline()
        .run(&stream, &pitch_store(), &CancellationToken::new())
        .unwrap();

    assert_eq!(playlist.len(), 1);
    assert_eq!(playlist.matches()[0].segment, Segment::new(0.0, stream.duration_s()));
}

#[test]
fn test_boundary_cap_yields_requested_segment_count() {
    // one frame per second; the level changes every 10 s by a distinct step
    let steps = [3, 17, 8, 1, 12, 20, 5, 9, 14, 2, 19, 6, 11, 4, 16, 7, 13, 10, 18, 15];
    let mut levels = vec![0.0f32];
    for step in steps {
        levels.push(levels.last().unwrap() + step as f32);
    }
    let frames: Vec<FeatureFrame> = (0..210)
        .map(|t| {
            let mut chroma = [0.0f32; CHROMA_BINS];
            chroma[0] = levels[t / 10];
            FeatureFrame::new(t as f64 + 0.5, chroma)
        })
        .collect();

    let boundary_config = BoundaryConfig {
        smoothing_window: 1,
        threshold: 0.5,
        min_segment_length_s: 2.0,
        max_segments: None,
    };
    let all = BoundaryDetector::new(&boundary_config).detect(frames.clone(), 210.0);
    assert_eq!(all.len(), 20);

    let capped = BoundaryDetector::new(&BoundaryConfig {
        max_segments: Some(5),
        ..boundary_config
    })
    .detect(frames, 210.0);
    let segments = split(&capped, 210.0).unwrap();

    assert_eq!(segments.len(), 5);
    let cuts: Vec<f64> = capped.iter().map(|b| b.time_s).collect();
    assert_eq!(cuts, vec![20.0, 60.0, 110.0, 190.0]);
}
