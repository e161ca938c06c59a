//! Transcoding fetched media to mono PCM WAV with `ffmpeg`.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use super::tool::run_tool;
use crate::error::{Result, SpeechcutError};

/// Converts any audio file into a WAV the core can read.
pub trait Transcoder: Send + Sync + 'static {
    /// # Errors
    /// `Transcode` when conversion fails.
    fn to_wav(&self, input: &Path, output: &Path) -> Result<()>;
}

/// `ffmpeg` backed transcoder producing mono WAV at a fixed rate.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    sample_rate: u32,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>, sample_rate: u32, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            sample_rate,
            timeout,
        }
    }

    fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-nostdin".into(),
            "-y".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            input.to_string_lossy().into_owned(),
            "-ar".into(),
            self.sample_rate.to_string(),
            "-ac".into(),
            "1".into(),
            output.to_string_lossy().into_owned(),
        ]
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", 16_000, Duration::from_secs(600))
    }
}

impl Transcoder for FfmpegTranscoder {
    fn to_wav(&self, input: &Path, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(input = %input.display(), output = %output.display(), "transcoding");
        run_tool(&self.program, self.args(input, output), self.timeout)
            .map_err(SpeechcutError::Transcode)?;
        info!(output = %output.display(), sample_rate = self.sample_rate, "transcoded");
        Ok(())
    }
}
