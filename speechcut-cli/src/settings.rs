//! Persistent CLI settings (JSON file in the user data directory).
//!
//! A missing file means defaults. Missing fields take their default values;
//! a file that does not parse is an error, never a silent fallback.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use speechcut_core::BatchConfig;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub batch: BatchConfig,
    /// Where `run` writes its JSON report, if anywhere.
    pub report_path: Option<PathBuf>,
}

impl Settings {
    /// Trim whitespace around tool names. Out-of-range values are left for
    /// `BatchConfig::validate` to reject.
    pub fn normalize(&mut self) {
        self.batch.ytdlp_program = self.batch.ytdlp_program.trim().to_string();
        self.batch.ffmpeg_program = self.batch.ffmpeg_program.trim().to_string();
    }
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("speechcut")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("speechcut")
            .join("settings.json")
    }
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read settings {}", path.display()));
        }
    };
    let mut settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("invalid settings file {}", path.display()))?;
    settings.normalize();
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
    fs::write(path, json)
}
