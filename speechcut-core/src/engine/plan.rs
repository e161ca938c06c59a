//! The result of segmenting one waveform, and lazy sample materialization.

use crate::audio::Waveform;
use crate::segment::normalize::Chunk;
use crate::segment::Segment;
use crate::silence::SilenceInterval;

/// Silences, segments and final chunks for one waveform.
///
/// Chunks refer to `segments` by index; no audio is copied until
/// [`ChunkPlan::materialize`] is called for a chunk.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    silences: Vec<SilenceInterval>,
    segments: Vec<Segment>,
    chunks: Vec<Chunk>,
}

impl ChunkPlan {
    pub fn new(
        silences: Vec<SilenceInterval>,
        segments: Vec<Segment>,
        chunks: Vec<Chunk>,
    ) -> Self {
        Self {
            silences,
            segments,
            chunks,
        }
    }

    pub fn silences(&self) -> &[SilenceInterval] {
        &self.silences
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn total_chunk_ms(&self) -> u64 {
        self.chunks.iter().map(|c| c.duration_ms).sum()
    }

    /// Copy out the samples of `chunk`.
    ///
    /// The chunk's segments are concatenated and the window
    /// `[offset_ms, offset_ms + duration_ms)` is taken from the result. A
    /// window that reaches the end of the concatenation takes every
    /// remaining sample, so the pieces of a split chunk always add back up
    /// to the whole.
    pub fn materialize(&self, waveform: &Waveform, chunk: &Chunk) -> Vec<f32> {
        let parts: Vec<&[f32]> = self.segments[chunk.segments.clone()]
            .iter()
            .map(|seg| waveform.slice_ms(seg.start_ms, seg.end_ms))
            .collect();
        let total_samples: usize = parts.iter().map(|p| p.len()).sum();
        let total_ms: u64 = self.segments[chunk.segments.clone()]
            .iter()
            .map(|seg| seg.duration_ms())
            .sum();

        let rate = u64::from(waveform.sample_rate());
        let to_samples = |ms: u64| -> usize {
            usize::try_from(ms.saturating_mul(rate) / 1000)
                .unwrap_or(usize::MAX)
                .min(total_samples)
        };

        let from = to_samples(chunk.offset_ms);
        let to = if chunk.offset_ms + chunk.duration_ms >= total_ms {
            total_samples
        } else {
            to_samples(chunk.offset_ms + chunk.duration_ms)
        };

        let mut out = Vec::with_capacity(to.saturating_sub(from));
        let mut cursor = 0usize;
        for part in parts {
            let part_end = cursor + part.len();
            if part_end > from && cursor < to {
                let lo = from.max(cursor) - cursor;
                let hi = to.min(part_end) - cursor;
                out.extend_from_slice(&part[lo..hi]);
            }
            cursor = part_end;
            if cursor >= to {
                break;
            }
        }
        out
    }
}
