//! Fetching remote media.
//!
//! `MediaFetcher` is the seam between the batch driver and the network;
//! `YtDlpFetcher` shells out to `yt-dlp`. Files are named by the media id
//! so titles with odd characters never reach the file system.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use super::tool::run_tool;
use crate::error::{Result, SpeechcutError};

/// Downloads the audio of one remote source into a directory.
pub trait MediaFetcher: Send + Sync + 'static {
    /// Fetch `url` into `download_dir` and return the local file path.
    ///
    /// # Errors
    /// `Fetch` when the source cannot be retrieved.
    fn fetch(&self, url: &str, download_dir: &Path) -> Result<PathBuf>;
}

/// `yt-dlp` backed fetcher extracting best audio to `<id>.m4a`.
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    program: String,
    timeout: Duration,
}

impl YtDlpFetcher {
    pub const AUDIO_EXT: &'static str = "m4a";

    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn args(url: &str, download_dir: &Path) -> Vec<String> {
        let template = download_dir.join("%(id)s.%(ext)s");
        vec![
            "--format".into(),
            "bestaudio/best".into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            Self::AUDIO_EXT.into(),
            "--output".into(),
            template.to_string_lossy().into_owned(),
            "--no-playlist".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "--no-simulate".into(),
            "--print".into(),
            "id".into(),
            url.into(),
        ]
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new("yt-dlp", Duration::from_secs(600))
    }
}

impl MediaFetcher for YtDlpFetcher {
    fn fetch(&self, url: &str, download_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(download_dir)?;
        debug!(url, dir = %download_dir.display(), "fetching with yt-dlp");

        let output = run_tool(&self.program, Self::args(url, download_dir), self.timeout)
            .map_err(SpeechcutError::Fetch)?;

        let media_id = output
            .stdout
            .lines()
            .map(str::trim)
            .rfind(|l| !l.is_empty())
            .ok_or_else(|| SpeechcutError::Fetch(format!("could not get media id for {url}")))?;

        let path = download_dir.join(format!("{media_id}.{}", Self::AUDIO_EXT));
        if !path.exists() {
            return Err(SpeechcutError::Fetch(format!(
                "downloaded file not found: {}",
                path.display()
            )));
        }
        info!(url, path = %path.display(), "fetched");
        Ok(path)
    }
}
