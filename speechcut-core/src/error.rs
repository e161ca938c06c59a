use thiserror::Error;

/// All errors produced by speechcut-core.
#[derive(Debug, Error)]
pub enum SpeechcutError {
    #[error("waveform is empty, nothing to segment")]
    EmptyInput,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("amplitude detection failed: {0}")]
    Detection(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("transcode failed: {0}")]
    Transcode(String),

    #[error("source list has no '{column}' column")]
    MissingColumn { column: String },

    #[error("export failed for {path}: {reason}")]
    Export {
        path: std::path::PathBuf,
        reason: String,
    },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SpeechcutError>;
