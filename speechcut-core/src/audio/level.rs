//! Amplitude levels in dBFS and fast windowed RMS.
//!
//! Levels are kept as linear RMS relative to full scale (1.0) and only
//! converted to decibels on demand, so digital silence stays representable
//! (its dBFS is `-inf`, its RMS is exactly `0.0`).

use super::Waveform;
use crate::error::{Result, SpeechcutError};

/// Mean loudness of a waveform or sub-range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeLevel {
    rms: f64,
}

impl AmplitudeLevel {
    /// Root-mean-square level of a sample slice.
    ///
    /// # Errors
    /// - `EmptyInput` for an empty slice.
    /// - `Detection` if the samples contain NaN or infinities.
    pub fn measure(samples: &[f32]) -> Result<Self> {
        if samples.is_empty() {
            return Err(SpeechcutError::EmptyInput);
        }
        let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
        let rms = (sum_sq / samples.len() as f64).sqrt();
        if !rms.is_finite() {
            return Err(SpeechcutError::Detection(format!(
                "non-finite RMS over {} samples",
                samples.len()
            )));
        }
        Ok(Self { rms })
    }

    pub fn from_rms(rms: f64) -> Self {
        Self { rms: rms.max(0.0) }
    }

    pub fn from_dbfs(dbfs: f64) -> Self {
        Self::from_rms(10f64.powf(dbfs / 20.0))
    }

    pub fn rms(self) -> f64 {
        self.rms
    }

    /// Level in decibels relative to full scale. `-inf` for digital silence.
    pub fn dbfs(self) -> f64 {
        if self.rms == 0.0 {
            f64::NEG_INFINITY
        } else {
            20.0 * self.rms.log10()
        }
    }

    /// The level `delta_db` decibels below this one.
    pub fn quieter_by(self, delta_db: f64) -> Self {
        Self::from_rms(self.rms * 10f64.powf(-delta_db / 20.0))
    }
}

/// Cumulative squared energy at each millisecond boundary of a waveform.
///
/// Holds one `f64` per millisecond (about 29 MB for an hour of audio) rather
/// than one per sample, and answers the RMS of any millisecond-aligned window
/// in O(1).
#[derive(Debug, Clone)]
pub struct EnergyProfile<'a> {
    waveform: &'a Waveform,
    /// `prefix[ms]`: energy of every sample before `waveform.sample_at_ms(ms)`.
    prefix: Vec<f64>,
    total: f64,
}

impl<'a> EnergyProfile<'a> {
    pub fn new(waveform: &'a Waveform) -> Self {
        let samples = waveform.samples();
        let len_ms = waveform.duration_ms();
        let mut prefix = Vec::with_capacity(usize::try_from(len_ms).unwrap_or(0) + 1);
        let mut acc = 0.0f64;
        let mut cursor = 0;
        for ms in 0..=len_ms {
            let boundary = waveform.sample_at_ms(ms);
            acc += energy(&samples[cursor..boundary]);
            cursor = boundary;
            prefix.push(acc);
        }
        let total = acc + energy(&samples[cursor..]);
        Self {
            waveform,
            prefix,
            total,
        }
    }

    /// Total squared energy; non-finite if any sample was NaN or infinite.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// RMS of the samples in `[start_ms, end_ms)`. Zero for an empty window.
    pub fn window_rms_ms(&self, start_ms: u64, end_ms: u64) -> f64 {
        let last = self.prefix.len().saturating_sub(1) as u64;
        let end_ms = end_ms.min(last);
        if end_ms <= start_ms {
            return 0.0;
        }
        let count = self.waveform.sample_at_ms(end_ms) - self.waveform.sample_at_ms(start_ms);
        if count == 0 {
            return 0.0;
        }
        // Cancellation in the subtraction can go a hair below zero.
        let energy = (self.prefix[end_ms as usize] - self.prefix[start_ms as usize]).max(0.0);
        (energy / count as f64).sqrt()
    }
}

fn energy(samples: &[f32]) -> f64 {
    samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn square_wave_rms() {
        let samples: Vec<f32> = (0..256)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let level = AmplitudeLevel::measure(&samples).unwrap();
        assert_relative_eq!(level.rms(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(level.dbfs(), -6.0206, epsilon = 1e-3);
    }

    #[test]
    fn silence_is_negative_infinity() {
        let level = AmplitudeLevel::measure(&[0.0; 64]).unwrap();
        assert_eq!(level.dbfs(), f64::NEG_INFINITY);
        assert_eq!(level.quieter_by(14.0).rms(), 0.0);
    }

    #[test]
    fn empty_slice_is_empty_input() {
        assert!(matches!(
            AmplitudeLevel::measure(&[]),
            Err(SpeechcutError::EmptyInput)
        ));
    }

    #[test]
    fn nan_sample_is_detection_error() {
        assert!(matches!(
            AmplitudeLevel::measure(&[0.1, f32::NAN, 0.2]),
            Err(SpeechcutError::Detection(_))
        ));
    }

    #[test]
    fn quieter_by_matches_dbfs_arithmetic() {
        let level = AmplitudeLevel::from_dbfs(-20.0).quieter_by(14.0);
        assert_relative_eq!(level.dbfs(), -34.0, epsilon = 1e-9);
    }

    #[test]
    fn window_rms_matches_direct_measure() {
        // At 1 kHz one millisecond is one sample.
        let samples: Vec<f32> = (0..1000).map(|i| ((i % 7) as f32 - 3.0) * 0.1).collect();
        let wf = Waveform::new(samples.clone(), 1_000);
        let profile = EnergyProfile::new(&wf);
        let direct = AmplitudeLevel::measure(&samples[120..480]).unwrap().rms();
        assert_relative_eq!(profile.window_rms_ms(120, 480), direct, epsilon = 1e-9);
        assert_eq!(profile.window_rms_ms(10, 10), 0.0);
    }

    #[test]
    fn millisecond_windows_cover_the_matching_samples() {
        let samples: Vec<f32> = (0..16_037).map(|i| ((i % 11) as f32 - 5.0) * 0.05).collect();
        let wf = Waveform::new(samples, 16_000);
        let profile = EnergyProfile::new(&wf);

        let direct = AmplitudeLevel::measure(wf.slice_ms(250, 700)).unwrap().rms();
        assert_relative_eq!(profile.window_rms_ms(250, 700), direct, epsilon = 1e-9);

        // The 5 samples past the last whole millisecond still count in the total.
        let whole = AmplitudeLevel::measure(wf.samples()).unwrap().rms();
        let total_rms = (profile.total() / wf.samples().len() as f64).sqrt();
        assert_relative_eq!(total_rms, whole, epsilon = 1e-9);

        // Windows past the end are clamped to the last millisecond boundary.
        let tail = AmplitudeLevel::measure(wf.slice_ms(600, 1_002)).unwrap().rms();
        assert_relative_eq!(profile.window_rms_ms(600, 5_000), tail, epsilon = 1e-9);
    }
}
