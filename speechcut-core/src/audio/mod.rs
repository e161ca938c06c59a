//! Decoded PCM audio as seen by the segmentation core.
//!
//! A [`Waveform`] is produced once per source (by the WAV loader in [`wav`])
//! and never mutated afterwards. Every later stage addresses it by
//! millisecond offsets; [`Waveform::sample_at_ms`] is the single place where
//! a millisecond offset turns into a sample index.

pub mod level;
pub mod wav;

/// A contiguous block of mono PCM samples at a known sample rate.
#[derive(Debug, Clone)]
pub struct Waveform {
    /// Mono f32 samples in [-1.0, 1.0] (full scale = 1.0).
    samples: Vec<f32>,
    /// Sample rate in Hz (e.g. 16000).
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns true if the waveform contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in whole milliseconds: `sample_count * 1000 / sample_rate`.
    ///
    /// Zero when the sample rate is zero.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / u64::from(self.sample_rate)
    }

    /// Index of the first sample at or after `ms`, clamped to the buffer length.
    pub fn sample_at_ms(&self, ms: u64) -> usize {
        let idx = ms.saturating_mul(u64::from(self.sample_rate)) / 1000;
        usize::try_from(idx)
            .unwrap_or(usize::MAX)
            .min(self.samples.len())
    }

    /// Samples covering the half-open millisecond range `[start_ms, end_ms)`.
    pub fn slice_ms(&self, start_ms: u64, end_ms: u64) -> &[f32] {
        let start = self.sample_at_ms(start_ms);
        let end = self.sample_at_ms(end_ms).max(start);
        &self.samples[start..end]
    }
}
