//! Per-source outcomes and the batch summary.
//!
//! Serialized as camelCase JSON; `status` is lowercase.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of processing one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOutcome {
    pub url: String,
    pub status: SourceStatus,
    /// Directory the chunks were written to.
    pub output_dir: Option<PathBuf>,
    /// Exported chunk files, in chunk order.
    pub chunks: Vec<PathBuf>,
    /// Total exported audio (ms).
    pub exported_ms: u64,
    /// Failure reason, if any.
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn exported(
        url: String,
        output_dir: PathBuf,
        chunks: Vec<PathBuf>,
        exported_ms: u64,
    ) -> Self {
        Self {
            url,
            status: SourceStatus::Exported,
            output_dir: Some(output_dir),
            chunks,
            exported_ms,
            error: None,
        }
    }

    pub fn failed(url: String, error: impl Into<String>) -> Self {
        Self {
            url,
            status: SourceStatus::Failed,
            output_dir: None,
            chunks: Vec::new(),
            exported_ms: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SourceStatus::Exported
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Exported,
    Failed,
}

/// All outcomes of one batch run, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub sources: Vec<SourceOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.sources.iter().filter(|s| s.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.sources.len() - self.succeeded()
    }

    pub fn chunks_exported(&self) -> usize {
        self.sources.iter().map(|s| s.chunks.len()).sum()
    }

    pub fn exported_ms(&self) -> u64 {
        self.sources.iter().map(|s| s.exported_ms).sum()
    }
}
