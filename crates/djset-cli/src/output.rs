//! Playlist and store listing output

use djset_core::{FingerprintStore, Match, Playlist};
use serde::Serialize;

#[derive(Serialize)]
struct PlaylistOutput<'a> {
    recording: &'a str,
    identified: usize,
    entries: Vec<djset_fp::PlaylistEntry>,
}

/// `MM:SS`, minutes unbounded
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// One timeline row: `MM:SS - MM:SS | title — artist (score=0.87)`
pub fn format_match(m: &Match) -> String {
    let span = format!("{} - {}", format_timestamp(m.start()), format_timestamp(m.end()));
    match (&m.title, &m.artist) {
        (Some(title), Some(artist)) => {
            format!("{} | {} — {} (score={:.2})", span, title, artist, m.confidence)
        }
        _ => format!("{} | unidentified", span),
    }
}

/// Print the playlist as a text timeline
pub fn print_timeline(playlist: &Playlist) {
    for m in playlist.matches() {
        println!("{}", format_match(m));
    }
}

/// Print the playlist as JSON with its recording path
pub fn print_json_playlist(recording: &str, playlist: &Playlist) {
    let output = PlaylistOutput {
        recording,
        identified: playlist.identified_count(),
        entries: playlist.entries(),
    };

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing playlist: {}", e),
    }
}

/// Print one line per stored track
pub fn print_store(store: &FingerprintStore) {
    for record in store.iter() {
        println!(
            "{}\t{} — {}\t{} hash(es)",
            record.track_id,
            record.title,
            record.artist,
            record.hashes.len()
        );
    }
    println!("{} track(s)", store.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use djset_core::{Fingerprint, FingerprintRecord, Segment};

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(61.4), "01:01");
        assert_eq!(format_timestamp(3725.0), "62:05");
    }

    #[test]
    fn test_format_identified_match() {
        let record = FingerprintRecord::new(
            "track-01",
            "Opening",
            "Someone",
            [Fingerprint::new("00ff")],
        );
        let m = Match::identified(Segment::new(0.0, 95.0), &record, 0.873);
        assert_eq!(format_match(&m), "00:00 - 01:35 | Opening — Someone (score=0.87)");
    }

    #[test]
    fn test_format_unidentified_match() {
        let m = Match::unidentified(Segment::new(95.0, 130.0));
        assert_eq!(format_match(&m), "01:35 - 02:10 | unidentified");
    }
}
