//! Silence detection against a threshold derived from the global mean level.
//!
//! ## Algorithm
//!
//! 1. Measure the mean RMS level `L` of the whole waveform.
//! 2. `threshold = L - threshold_delta_db`.
//! 3. Slide a window of `min_silence_ms` across the waveform in 1 ms steps;
//!    a window whose RMS is at or below the threshold is silent.
//! 4. Silent windows that overlap or touch are unioned into one interval.
//!
//! A stretch quieter than the threshold but shorter than the window never
//! produces a silent window, so it stays embedded in speech.
//!
//! The threshold is global: a quiet passage inside a loud recording counts as
//! silence even when it holds speech.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::level::{AmplitudeLevel, EnergyProfile};
use crate::audio::Waveform;
use crate::error::{Result, SpeechcutError};

/// Half-open silent range `[start_ms, end_ms)` within a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilenceInterval {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SilenceInterval {
    pub fn duration_ms(self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Finds silence intervals relative to a waveform's own mean level.
#[derive(Debug, Clone)]
pub struct SilenceDetector {
    /// Shortest run (ms) that counts as a boundary.
    min_silence_ms: u64,
    /// How many dB below the mean level counts as silence.
    threshold_delta_db: f64,
}

impl SilenceDetector {
    pub fn new(min_silence_ms: u64, threshold_delta_db: f64) -> Self {
        Self {
            min_silence_ms,
            threshold_delta_db,
        }
    }

    /// The absolute threshold this detector would apply to `waveform`.
    ///
    /// # Errors
    /// - `EmptyInput` for a zero-length waveform.
    /// - `Detection` for a zero sample rate or non-finite samples.
    pub fn threshold_for(&self, waveform: &Waveform) -> Result<AmplitudeLevel> {
        let mean = AmplitudeLevel::measure(waveform.samples())?;
        Ok(mean.quieter_by(self.threshold_delta_db))
    }

    /// Detect all silence intervals, in increasing non-overlapping order.
    ///
    /// # Errors
    /// - `EmptyInput` for a zero-length waveform.
    /// - `Detection` for a zero sample rate or non-finite samples.
    pub fn detect(&self, waveform: &Waveform) -> Result<Vec<SilenceInterval>> {
        if waveform.is_empty() {
            return Err(SpeechcutError::EmptyInput);
        }
        if waveform.sample_rate() == 0 {
            return Err(SpeechcutError::Detection("sample rate is zero".into()));
        }
        if self.min_silence_ms == 0 {
            return Err(SpeechcutError::InvalidConfig(
                "min_silence_ms must be at least 1".into(),
            ));
        }

        let profile = EnergyProfile::new(waveform);
        if !profile.total().is_finite() {
            return Err(SpeechcutError::Detection(
                "waveform contains non-finite samples".into(),
            ));
        }
        let mean = AmplitudeLevel::from_rms(
            (profile.total() / waveform.samples().len() as f64).sqrt(),
        );
        let threshold = mean.quieter_by(self.threshold_delta_db);

        let len_ms = waveform.duration_ms();
        debug!(
            len_ms,
            mean_dbfs = mean.dbfs(),
            threshold_dbfs = threshold.dbfs(),
            min_silence_ms = self.min_silence_ms,
            "scanning for silence"
        );

        if len_ms < self.min_silence_ms {
            return Ok(Vec::new());
        }

        let mut intervals = Vec::new();
        let mut current: Option<SilenceInterval> = None;
        let last_start = len_ms - self.min_silence_ms;

        for start_ms in 0..=last_start {
            let end_ms = start_ms + self.min_silence_ms;
            let rms = profile.window_rms_ms(start_ms, end_ms);
            if rms > threshold.rms() {
                continue;
            }
            match current.as_mut() {
                Some(open) if start_ms <= open.end_ms => open.end_ms = end_ms,
                _ => {
                    if let Some(done) = current.take() {
                        intervals.push(done);
                    }
                    current = Some(SilenceInterval { start_ms, end_ms });
                }
            }
        }
        intervals.extend(current);

        debug!(count = intervals.len(), "silence intervals detected");
        Ok(intervals)
    }
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::new(450, 14.0)
    }
}
