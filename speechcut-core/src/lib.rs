//! # speechcut-core
//!
//! Cuts decoded speech audio into short, uniformly sized chunks.
//!
//! ## Architecture
//!
//! ```text
//! Waveform → SilenceDetector → SegmentSplitter → ChunkNormalizer → ChunkPlan
//!                                                                     │
//!                                                     export_plan → <stem>_chunkNNN.wav
//! ```
//!
//! The segmentation core (`silence`, `segment`, `engine`) is pure and
//! synchronous. `batch` wraps it with fetching, transcoding and export, and
//! runs many sources concurrently without letting one failure stop the rest.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod batch;
pub mod engine;
pub mod error;
pub mod report;
pub mod segment;
pub mod silence;

// Convenience re-exports for downstream crates
pub use audio::Waveform;
pub use batch::{BatchConfig, BatchRunner};
pub use engine::{ChunkPlan, SegmentationConfig, Segmenter};
pub use error::SpeechcutError;
pub use report::{BatchReport, SourceOutcome, SourceStatus};
pub use segment::normalize::{Chunk, ChunkKind, ChunkNormalizer};
pub use segment::{Segment, SegmentSplitter};
pub use silence::{SilenceDetector, SilenceInterval};
