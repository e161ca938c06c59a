//! Chunk normalization: merge undersized segments forward, then slice
//! oversized chunks into bounded pieces.
//!
//! ## Phase A: merge-forward
//!
//! One left-to-right pass. A segment already at `min_chunk_s` is emitted on
//! its own. An undersized segment opens a group that absorbs the following
//! segments until the group reaches `min_chunk_s` or input runs out; the
//! group is emitted and the scan resumes after its last member. A short tail
//! that never reaches the minimum is still emitted.
//!
//! ## Phase B: split-oversized
//!
//! Each chunk longer than `max_chunk_s` becomes consecutive pieces of exactly
//! `max_chunk_s`, the last piece holding the remainder. A chunk exactly at
//! the maximum is left alone.
//!
//! Chunks never copy audio: they are index ranges over the segment list plus
//! an offset on the concatenated timeline of those segments.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Segment;
use crate::error::{Result, SpeechcutError};

/// How a chunk came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ChunkKind {
    /// Exactly one segment, untouched.
    Single,
    /// Two or more adjacent segments concatenated.
    Merged,
    /// Piece `index` (0-based) of `count` cut from an oversized chunk.
    Piece { index: usize, count: usize },
}

/// A final exportable unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Indices into the segment list whose audio is concatenated.
    pub segments: Range<usize>,
    /// Start of this chunk on the concatenated timeline of `segments`.
    pub offset_ms: u64,
    pub duration_ms: u64,
    pub kind: ChunkKind,
}

impl Chunk {
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    pub fn is_piece(&self) -> bool {
        matches!(self.kind, ChunkKind::Piece { .. })
    }
}

/// Applies the merge-forward / split-oversized policy.
#[derive(Debug, Clone)]
pub struct ChunkNormalizer {
    min_chunk_s: f64,
    max_chunk_ms: u64,
}

impl ChunkNormalizer {
    /// # Errors
    /// `InvalidConfig` unless `0 <= min_chunk_s < max_chunk_s`, both finite,
    /// and `max_chunk_s` is at least one millisecond.
    pub fn new(min_chunk_s: f64, max_chunk_s: f64) -> Result<Self> {
        if !min_chunk_s.is_finite() || !max_chunk_s.is_finite() {
            return Err(SpeechcutError::InvalidConfig(format!(
                "chunk bounds must be finite (min={min_chunk_s}, max={max_chunk_s})"
            )));
        }
        if min_chunk_s < 0.0 {
            return Err(SpeechcutError::InvalidConfig(format!(
                "min_chunk_s must not be negative (got {min_chunk_s})"
            )));
        }
        if max_chunk_s <= min_chunk_s {
            return Err(SpeechcutError::InvalidConfig(format!(
                "max_chunk_s ({max_chunk_s}) must be greater than min_chunk_s ({min_chunk_s})"
            )));
        }
        let max_chunk_ms = (max_chunk_s * 1000.0) as u64;
        if max_chunk_ms == 0 {
            return Err(SpeechcutError::InvalidConfig(format!(
                "max_chunk_s ({max_chunk_s}) is below one millisecond"
            )));
        }
        Ok(Self {
            min_chunk_s,
            max_chunk_ms,
        })
    }

    pub fn max_chunk_ms(&self) -> u64 {
        self.max_chunk_ms
    }

    /// Both phases in order. Zero segments yield zero chunks.
    pub fn normalize(&self, segments: &[Segment]) -> Vec<Chunk> {
        let merged = self.merge_forward(segments);
        let merged_count = merged.len();
        let chunks = self.split_oversized(merged);
        debug!(
            segments = segments.len(),
            merged = merged_count,
            chunks = chunks.len(),
            "normalized chunks"
        );
        chunks
    }

    /// Phase A.
    pub fn merge_forward(&self, segments: &[Segment]) -> Vec<Chunk> {
        let mut out = Vec::new();
        let mut i = 0;

        while i < segments.len() {
            let first = segments[i].duration_ms();
            if self.meets_min(first) {
                out.push(Chunk {
                    segments: i..i + 1,
                    offset_ms: 0,
                    duration_ms: first,
                    kind: ChunkKind::Single,
                });
                i += 1;
                continue;
            }

            let mut j = i + 1;
            let mut total = first;
            while j < segments.len() && !self.meets_min(total) {
                total += segments[j].duration_ms();
                j += 1;
            }
            out.push(Chunk {
                segments: i..j,
                offset_ms: 0,
                duration_ms: total,
                kind: if j - i > 1 {
                    ChunkKind::Merged
                } else {
                    ChunkKind::Single
                },
            });
            i = j;
        }

        out
    }

    /// Phase B.
    pub fn split_oversized(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        let max = self.max_chunk_ms;
        let mut out = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            if chunk.duration_ms <= max {
                out.push(chunk);
                continue;
            }

            let count = usize::try_from(chunk.duration_ms.div_ceil(max)).unwrap_or(usize::MAX);
            let mut start = 0u64;
            let mut index = 0usize;
            while start < chunk.duration_ms {
                let len = max.min(chunk.duration_ms - start);
                out.push(Chunk {
                    segments: chunk.segments.clone(),
                    offset_ms: chunk.offset_ms + start,
                    duration_ms: len,
                    kind: ChunkKind::Piece { index, count },
                });
                start += len;
                index += 1;
            }
        }

        out
    }

    fn meets_min(&self, duration_ms: u64) -> bool {
        duration_ms as f64 / 1000.0 >= self.min_chunk_s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Segments laid end to end with a 500 ms gap between them.
    fn segments_of(durations_ms: &[u64]) -> Vec<Segment> {
        let mut cursor = 0;
        durations_ms
            .iter()
            .map(|&d| {
                let seg = Segment::new(cursor, cursor + d);
                cursor += d + 500;
                seg
            })
            .collect()
    }

    fn durations(chunks: &[Chunk]) -> Vec<u64> {
        chunks.iter().map(|c| c.duration_ms).collect()
    }

    #[test]
    fn rejects_max_not_above_min() {
        assert!(matches!(
            ChunkNormalizer::new(5.0, 3.0),
            Err(SpeechcutError::InvalidConfig(_))
        ));
        assert!(matches!(
            ChunkNormalizer::new(3.0, 3.0),
            Err(SpeechcutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_negative_and_non_finite_bounds() {
        assert!(ChunkNormalizer::new(-1.0, 3.0).is_err());
        assert!(ChunkNormalizer::new(1.0, f64::INFINITY).is_err());
        assert!(ChunkNormalizer::new(f64::NAN, 3.0).is_err());
        assert!(ChunkNormalizer::new(0.0, 0.0004).is_err());
    }

    #[test]
    fn no_segments_no_chunks() {
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        assert!(norm.normalize(&[]).is_empty());
    }

    #[test]
    fn short_run_merges_into_one_chunk() {
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        let chunks = norm.normalize(&segments_of(&[1_000, 1_000, 1_500]));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].duration_ms, 3_500);
        assert_eq!(chunks[0].segments, 0..3);
        assert_eq!(chunks[0].kind, ChunkKind::Merged);
    }

    #[test]
    fn long_enough_segments_pass_through_in_order() {
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        let chunks = norm.merge_forward(&segments_of(&[4_000, 1_000, 2_500, 3_000]));
        assert_eq!(durations(&chunks), vec![4_000, 3_500, 3_000]);
        assert_eq!(chunks[0].segments, 0..1);
        assert_eq!(chunks[1].segments, 1..3);
        assert_eq!(chunks[2].segments, 3..4);
    }

    #[test]
    fn merge_never_looks_backward() {
        // The 1 s segment after a 4 s one starts its own group.
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        let chunks = norm.merge_forward(&segments_of(&[4_000, 1_000]));
        assert_eq!(durations(&chunks), vec![4_000, 1_000]);
    }

    #[test]
    fn undersized_tail_is_kept() {
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        let chunks = norm.normalize(&segments_of(&[3_200, 800, 900]));
        assert_eq!(durations(&chunks), vec![3_200, 1_700]);
        assert_eq!(chunks[1].kind, ChunkKind::Merged);
    }

    #[test]
    fn oversized_chunk_is_sliced_with_remainder_last() {
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        let chunks = norm.normalize(&segments_of(&[17_500]));
        assert_eq!(durations(&chunks), vec![8_000, 8_000, 1_500]);
        let offsets: Vec<u64> = chunks.iter().map(|c| c.offset_ms).collect();
        assert_eq!(offsets, vec![0, 8_000, 16_000]);
        assert_eq!(chunks[2].kind, ChunkKind::Piece { index: 2, count: 3 });
    }

    #[test]
    fn chunk_exactly_at_max_is_not_split() {
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        let chunks = norm.normalize(&segments_of(&[8_000]));
        assert_eq!(durations(&chunks), vec![8_000]);
        assert_eq!(chunks[0].kind, ChunkKind::Single);
    }

    #[test]
    fn merged_group_can_overflow_and_be_split() {
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        let chunks = norm.normalize(&segments_of(&[2_900, 9_000]));
        assert_eq!(durations(&chunks), vec![8_000, 3_900]);
        assert!(chunks.iter().all(|c| c.segments == (0..2)));
        assert!(chunks.iter().all(Chunk::is_piece));
    }

    #[test]
    fn normalizing_in_bounds_chunks_is_identity() {
        let norm = ChunkNormalizer::new(3.0, 8.0).unwrap();
        let first = norm.normalize(&segments_of(&[3_000, 500, 2_600, 7_999, 4_200]));
        assert!(first.iter().all(|c| (3_000..=8_000).contains(&c.duration_ms)));

        let again = norm.normalize(&segments_of(&durations(&first)));
        assert_eq!(durations(&again), durations(&first));
        assert!(again.iter().all(|c| c.kind == ChunkKind::Single));
    }
}
