//! Silence intervals → padded speech segments.
//!
//! The regions between silence intervals become segments. Each is widened by
//! `keep_silence_ms` on both sides; when the paddings of two neighbours would
//! overlap, both edges are moved to the midpoint of the overlap. Edges are
//! then clamped to the waveform and empty segments are dropped.

pub mod normalize;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::Waveform;
use crate::silence::SilenceInterval;

/// A contiguous `[start_ms, end_ms)` sub-range of a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl Segment {
    pub fn new(start_ms: u64, end_ms: u64) -> Self {
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Turns silence intervals into padded, non-overlapping speech segments.
#[derive(Debug, Clone)]
pub struct SegmentSplitter {
    keep_silence_ms: u64,
}

impl SegmentSplitter {
    pub fn new(keep_silence_ms: u64) -> Self {
        Self { keep_silence_ms }
    }

    /// Split `waveform` at `silences`, which must be sorted and disjoint
    /// (as [`crate::silence::SilenceDetector::detect`] returns them).
    pub fn split(&self, waveform: &Waveform, silences: &[SilenceInterval]) -> Vec<Segment> {
        let len_ms = waveform.duration_ms();
        let speech = speech_regions(len_ms, silences);

        let keep = i64::try_from(self.keep_silence_ms).unwrap_or(i64::MAX / 4);
        let mut padded: Vec<(i64, i64)> = speech
            .iter()
            .map(|&(start, end)| (start as i64 - keep, end as i64 + keep))
            .collect();

        for i in 1..padded.len() {
            let prev_end = padded[i - 1].1;
            let next_start = padded[i].0;
            if prev_end > next_start {
                let mid = (prev_end + next_start).div_euclid(2);
                padded[i - 1].1 = mid;
                padded[i].0 = mid;
            }
        }

        let len = len_ms as i64;
        let segments: Vec<Segment> = padded
            .into_iter()
            .map(|(start, end)| (start.clamp(0, len), end.clamp(0, len)))
            .filter(|(start, end)| end > start)
            .map(|(start, end)| Segment::new(start as u64, end as u64))
            .collect();

        debug!(
            silences = silences.len(),
            segments = segments.len(),
            keep_silence_ms = self.keep_silence_ms,
            "split into segments"
        );
        segments
    }
}

/// Non-silent `(start, end)` regions between silences, unpadded.
fn speech_regions(len_ms: u64, silences: &[SilenceInterval]) -> Vec<(u64, u64)> {
    if silences.is_empty() {
        return vec![(0, len_ms)];
    }

    let mut regions = Vec::with_capacity(silences.len() + 1);
    let mut prev_end = 0u64;
    for iv in silences {
        regions.push((prev_end, iv.start_ms));
        prev_end = iv.end_ms;
    }
    if prev_end < len_ms {
        regions.push((prev_end, len_ms));
    }
    regions.retain(|(start, end)| end > start);
    regions
}
