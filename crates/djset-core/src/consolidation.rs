//! Playlist consolidation
//!
//! Consecutive matches with the same identity collapse into one, and short
//! unidentified fragments are absorbed into a neighbour. The covered span
//! never changes: merging removes interior boundaries and absorption moves a
//! boundary onto an existing segment edge.

use crate::config::ConsolidationConfig;
use crate::playlist::Match;

pub struct Consolidator {
    min_track_length_s: f64,
}

impl Consolidator {
    pub fn new(config: &ConsolidationConfig) -> Self {
        Self {
            min_track_length_s: config.min_track_length_s,
        }
    }

    /// Consolidate time-ordered, contiguous matches. Idempotent.
    pub fn consolidate(&self, matches: Vec<Match>) -> Vec<Match> {
        let before = matches.len();
        let merged = merge_runs(matches);
        let absorbed = self.absorb_fragments(merged);
        let result = merge_runs(absorbed);

        log::debug!("Consolidated {} matches into {}", before, result.len());
        result
    }

    fn is_fragment(&self, m: &Match) -> bool {
        !m.is_identified() && m.duration() < self.min_track_length_s
    }

    /// Fold each short unidentified match into its left neighbour, or into
    /// its right neighbour when it opens the playlist.
    fn absorb_fragments(&self, matches: Vec<Match>) -> Vec<Match> {
        if matches.len() < 2 {
            return matches;
        }

        let mut out: Vec<Match> = Vec::with_capacity(matches.len());
        let mut pending: Option<Match> = None;

        for m in matches {
            if self.is_fragment(&m) {
                if let Some(left) = out.last_mut() {
                    log::trace!(
                        "Absorbing {:.2}-{:.2}s into {:?} on the left",
                        m.start(),
                        m.end(),
                        left.track_id
                    );
                    left.segment.end = m.segment.end;
                } else {
                    pending = Some(match pending {
                        Some(mut head) => {
                            head.segment.end = m.segment.end;
                            head
                        }
                        None => m,
                    });
                }
                continue;
            }

            let mut m = m;
            if let Some(head) = pending.take() {
                log::trace!(
                    "Absorbing {:.2}-{:.2}s into {:?} on the right",
                    head.start(),
                    head.end(),
                    m.track_id
                );
                m.segment.start = head.segment.start;
            }
            out.push(m);
        }

        // Only fragments: nothing to absorb them into
        if let Some(head) = pending {
            out.push(head);
        }

        out
    }
}

/// Collapse consecutive matches sharing a `track_id` (including `None`)
fn merge_runs(matches: Vec<Match>) -> Vec<Match> {
    let mut out: Vec<Match> = Vec::with_capacity(matches.len());

    for m in matches {
        match out.last_mut() {
            Some(last) if last.track_id == m.track_id => {
                last.segment.start = last.segment.start.min(m.segment.start);
                last.segment.end = last.segment.end.max(m.segment.end);
                if m.confidence > last.confidence {
                    last.confidence = m.confidence;
                    last.title = m.title;
                    last.artist = m.artist;
                }
            }
            _ => out.push(m),
        }
    }

    out
}
