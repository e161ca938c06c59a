//! `Segmenter`: chains detection, splitting and normalization for one waveform.
//!
//! ```text
//! Waveform ─► SilenceDetector ─► SegmentSplitter ─► ChunkNormalizer ─► ChunkPlan
//! ```
//!
//! A `Segmenter` is immutable after construction and holds no per-call
//! state, so one instance can be shared across threads and sources.

pub mod plan;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    audio::Waveform,
    error::{Result, SpeechcutError},
    segment::{normalize::ChunkNormalizer, SegmentSplitter},
    silence::SilenceDetector,
};

pub use plan::ChunkPlan;

/// Tuning knobs for segmentation. All fields have defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SegmentationConfig {
    /// Minimum silence run (ms) that counts as a boundary. Default: 450.
    pub min_silence_ms: u64,
    /// dB below the waveform's mean level counted as silence. Default: 14.
    pub threshold_delta_db: f64,
    /// Padding (ms) kept at each segment edge. Default: 120.
    pub keep_silence_ms: u64,
    /// Minimum merged-chunk duration in seconds. Default: 3.0.
    pub min_chunk_s: f64,
    /// Maximum chunk duration in seconds before splitting. Default: 8.0.
    pub max_chunk_s: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_silence_ms: 450,
            threshold_delta_db: 14.0,
            keep_silence_ms: 120,
            min_chunk_s: 3.0,
            max_chunk_s: 8.0,
        }
    }
}

impl SegmentationConfig {
    /// # Errors
    /// `InvalidConfig` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.min_silence_ms == 0 {
            return Err(SpeechcutError::InvalidConfig(
                "min_silence_ms must be at least 1".into(),
            ));
        }
        if !self.threshold_delta_db.is_finite() || self.threshold_delta_db < 0.0 {
            return Err(SpeechcutError::InvalidConfig(format!(
                "threshold_delta_db must be a finite non-negative number (got {})",
                self.threshold_delta_db
            )));
        }
        ChunkNormalizer::new(self.min_chunk_s, self.max_chunk_s).map(|_| ())
    }
}

/// The segmentation core for one configuration.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmentationConfig,
    detector: SilenceDetector,
    splitter: SegmentSplitter,
    normalizer: ChunkNormalizer,
}

impl Segmenter {
    /// Validate `config` and build the stages.
    ///
    /// # Errors
    /// `InvalidConfig`, rejected before any audio is touched.
    pub fn new(config: SegmentationConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = ChunkNormalizer::new(config.min_chunk_s, config.max_chunk_s)?;
        Ok(Self {
            detector: SilenceDetector::new(config.min_silence_ms, config.threshold_delta_db),
            splitter: SegmentSplitter::new(config.keep_silence_ms),
            normalizer,
            config,
        })
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Run all three stages over `waveform`.
    ///
    /// # Errors
    /// - `EmptyInput` for a zero-length waveform.
    /// - `Detection` if the amplitude level cannot be computed.
    pub fn plan(&self, waveform: &Waveform) -> Result<ChunkPlan> {
        let silences = self.detector.detect(waveform)?;
        let segments = self.splitter.split(waveform, &silences);
        let chunks = self.normalizer.normalize(&segments);

        debug!(
            silences = silences.len(),
            segments = segments.len(),
            "segmentation stages complete"
        );
        info!(
            duration_ms = waveform.duration_ms(),
            chunks = chunks.len(),
            "chunk plan ready"
        );

        Ok(ChunkPlan::new(silences, segments, chunks))
    }
}
