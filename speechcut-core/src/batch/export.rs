//! Writing chunks to disk.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::audio::{wav::write_wav_pcm16, Waveform};
use crate::engine::ChunkPlan;
use crate::error::{Result, SpeechcutError};

/// Persists one chunk's samples.
pub trait ChunkExporter: Send + Sync + 'static {
    /// # Errors
    /// `Export` (or `Io`/`Wav`) when the chunk cannot be written.
    fn export(&self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<()>;
}

/// Writes 16-bit PCM mono WAV files.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavExporter;

impl ChunkExporter for WavExporter {
    fn export(&self, path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
        write_wav_pcm16(path, samples, sample_rate).map_err(|e| SpeechcutError::Export {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// `<stem>_chunkNNN.wav`, with a 1-based index zero-padded to three digits.
pub fn chunk_file_name(stem: &str, index: usize) -> String {
    format!("{stem}_chunk{index:03}.wav")
}

/// Materialize and export every chunk of `plan` into `out_dir`.
///
/// Returns the written paths in chunk order.
pub fn export_plan(
    exporter: &dyn ChunkExporter,
    plan: &ChunkPlan,
    waveform: &Waveform,
    out_dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(plan.chunks().len());
    for (i, chunk) in plan.chunks().iter().enumerate() {
        let path = out_dir.join(chunk_file_name(stem, i + 1));
        let samples = plan.materialize(waveform, chunk);
        exporter.export(&path, &samples, waveform.sample_rate())?;
        debug!(path = %path.display(), duration_ms = chunk.duration_ms, "chunk exported");
        written.push(path);
    }
    Ok(written)
}
