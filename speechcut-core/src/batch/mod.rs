//! Batch driver: many remote sources → chunk files, one isolated pipeline each.
//!
//! ## Per-source stages
//!
//! ```text
//! url ─► MediaFetcher ─► Transcoder (skipped if the WAV exists)
//!     ─► read_wav_mono ─► Segmenter::plan ─► export_plan
//! ```
//!
//! Sources run concurrently on the Tokio blocking pool, at most
//! `BatchConfig::workers` at a time. A source that fails (or panics) is
//! recorded in the report and never stops the others.

pub mod export;
pub mod fetch;
pub mod source;
pub mod tool;
pub mod transcode;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{error, info, info_span, warn};

use crate::{
    audio::wav::read_wav_mono,
    engine::{SegmentationConfig, Segmenter},
    error::{Result, SpeechcutError},
    report::{BatchReport, SourceOutcome},
};

use export::{export_plan, ChunkExporter, WavExporter};
use fetch::{MediaFetcher, YtDlpFetcher};
use transcode::{FfmpegTranscoder, Transcoder};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct BatchConfig {
    /// Scratch directory; downloads land in `<tmp_dir>/downloads`.
    pub tmp_dir: PathBuf,
    /// Chunks are written to `<out_root>/<source stem>/`.
    pub out_root: PathBuf,
    /// Maximum sources processed at once. Default: 2.
    pub workers: usize,
    /// Sample rate the transcoder produces (Hz). Default: 16000.
    pub target_sample_rate: u32,
    /// Deadline for each external tool invocation (s). Default: 600.
    pub tool_timeout_secs: u64,
    pub ytdlp_program: String,
    pub ffmpeg_program: String,
    pub segmentation: SegmentationConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            tmp_dir: PathBuf::from("./tmp"),
            out_root: PathBuf::from("./output_chunks"),
            workers: 2,
            target_sample_rate: 16_000,
            tool_timeout_secs: 600,
            ytdlp_program: "yt-dlp".into(),
            ffmpeg_program: "ffmpeg".into(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl BatchConfig {
    /// # Errors
    /// `InvalidConfig` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(SpeechcutError::InvalidConfig(
                "workers must be at least 1".into(),
            ));
        }
        if self.target_sample_rate == 0 {
            return Err(SpeechcutError::InvalidConfig(
                "target_sample_rate must be positive".into(),
            ));
        }
        if self.tool_timeout_secs == 0 {
            return Err(SpeechcutError::InvalidConfig(
                "tool_timeout_secs must be positive".into(),
            ));
        }
        if self.ytdlp_program.trim().is_empty() || self.ffmpeg_program.trim().is_empty() {
            return Err(SpeechcutError::InvalidConfig(
                "tool program names must not be blank".into(),
            ));
        }
        self.segmentation.validate()
    }

    pub fn download_dir(&self) -> PathBuf {
        self.tmp_dir.join("downloads")
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

/// Counters accumulated over a runner's lifetime, shared by its clones.
///
/// Never reset: concurrent runs on clones of one runner all add to the same
/// totals. Per-run figures live in the [`BatchReport`] each run returns.
pub struct BatchDiagnostics {
    pub sources_seen: AtomicUsize,
    pub sources_succeeded: AtomicUsize,
    pub sources_failed: AtomicUsize,
    pub chunks_exported: AtomicUsize,
    pub exported_ms: AtomicU64,
}

impl Default for BatchDiagnostics {
    fn default() -> Self {
        Self {
            sources_seen: AtomicUsize::new(0),
            sources_succeeded: AtomicUsize::new(0),
            sources_failed: AtomicUsize::new(0),
            chunks_exported: AtomicUsize::new(0),
            exported_ms: AtomicU64::new(0),
        }
    }
}

impl BatchDiagnostics {
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            sources_seen: self.sources_seen.load(Ordering::Relaxed),
            sources_succeeded: self.sources_succeeded.load(Ordering::Relaxed),
            sources_failed: self.sources_failed.load(Ordering::Relaxed),
            chunks_exported: self.chunks_exported.load(Ordering::Relaxed),
            exported_ms: self.exported_ms.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub sources_seen: usize,
    pub sources_succeeded: usize,
    pub sources_failed: usize,
    pub chunks_exported: usize,
    pub exported_ms: u64,
}

/// Chunks written for one WAV file.
#[derive(Debug, Clone)]
pub struct ExportedSource {
    pub output_dir: PathBuf,
    pub chunks: Vec<PathBuf>,
    pub exported_ms: u64,
}

/// Drives many sources through fetch → transcode → segment → export.
///
/// Cheap to clone: every field is shared.
#[derive(Clone)]
pub struct BatchRunner {
    config: Arc<BatchConfig>,
    segmenter: Arc<Segmenter>,
    fetcher: Arc<dyn MediaFetcher>,
    transcoder: Arc<dyn Transcoder>,
    exporter: Arc<dyn ChunkExporter>,
    diagnostics: Arc<BatchDiagnostics>,
    /// One lock per source stem: two URLs resolving to the same media must
    /// not transcode or export into the same files at once.
    stem_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl BatchRunner {
    /// Runner backed by `yt-dlp`, `ffmpeg` and WAV export.
    ///
    /// # Errors
    /// `InvalidConfig` if `config` does not validate.
    pub fn new(config: BatchConfig) -> Result<Self> {
        let fetcher = YtDlpFetcher::new(config.ytdlp_program.clone(), config.tool_timeout());
        let transcoder = FfmpegTranscoder::new(
            config.ffmpeg_program.clone(),
            config.target_sample_rate,
            config.tool_timeout(),
        );
        Self::with_collaborators(config, fetcher, transcoder, WavExporter)
    }

    /// Runner with caller-supplied collaborators.
    ///
    /// # Errors
    /// `InvalidConfig` if `config` does not validate.
    pub fn with_collaborators(
        config: BatchConfig,
        fetcher: impl MediaFetcher,
        transcoder: impl Transcoder,
        exporter: impl ChunkExporter,
    ) -> Result<Self> {
        config.validate()?;
        let segmenter = Segmenter::new(config.segmentation.clone())?;
        Ok(Self {
            config: Arc::new(config),
            segmenter: Arc::new(segmenter),
            fetcher: Arc::new(fetcher),
            transcoder: Arc::new(transcoder),
            exporter: Arc::new(exporter),
            diagnostics: Arc::new(BatchDiagnostics::default()),
            stem_locks: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Process every URL in the `url` column of a CSV file.
    ///
    /// # Errors
    /// Only for an unreadable source list; per-source failures are in the report.
    pub async fn run_csv(&self, csv_path: &Path) -> Result<BatchReport> {
        let urls = source::read_source_urls(csv_path)?;
        Ok(self.run_urls(urls).await)
    }

    /// Process `urls` concurrently. Outcomes keep input order.
    pub async fn run_urls(&self, urls: Vec<String>) -> BatchReport {
        let total = urls.len();
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        info!(total, workers = self.config.workers, "batch started");

        let mut handles = Vec::with_capacity(total);
        for (idx, url) in urls.iter().cloned().enumerate() {
            let runner = self.clone();
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || runner.process_source(idx + 1, total, &url))
                    .await
            }));
        }

        let mut report = BatchReport::default();
        for (url, handle) in urls.into_iter().zip(handles) {
            let outcome = match handle.await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(join_err)) | Err(join_err) => {
                    error!(url = url.as_str(), "source worker died: {join_err}");
                    self.diagnostics.sources_failed.fetch_add(1, Ordering::Relaxed);
                    SourceOutcome::failed(url, format!("worker died: {join_err}"))
                }
            };
            report.sources.push(outcome);
        }

        info!(
            total,
            succeeded = report.succeeded(),
            failed = report.failed(),
            chunks = report.chunks_exported(),
            elapsed_s = started.elapsed().as_secs_f64(),
            "batch finished"
        );
        report
    }

    /// Run one source end to end, converting any failure into an outcome.
    pub fn process_source(&self, position: usize, total: usize, url: &str) -> SourceOutcome {
        let span = info_span!("source", position, total, url);
        let _enter = span.enter();
        self.diagnostics.sources_seen.fetch_add(1, Ordering::Relaxed);
        info!("[{position}/{total}] processing {url}");

        match self.fetch_and_export(url) {
            Ok(done) => {
                self.diagnostics
                    .sources_succeeded
                    .fetch_add(1, Ordering::Relaxed);
                info!(
                    chunks = done.chunks.len(),
                    dir = %done.output_dir.display(),
                    "exported {} chunks",
                    done.chunks.len()
                );
                SourceOutcome::exported(
                    url.to_string(),
                    done.output_dir,
                    done.chunks,
                    done.exported_ms,
                )
            }
            Err(e) => {
                self.diagnostics.sources_failed.fetch_add(1, Ordering::Relaxed);
                warn!("source failed: {e}");
                SourceOutcome::failed(url.to_string(), e.to_string())
            }
        }
    }

    fn fetch_and_export(&self, url: &str) -> Result<ExportedSource> {
        let downloaded = self.fetcher.fetch(url, &self.config.download_dir())?;
        let wav_path = downloaded.with_extension("wav");
        let stem = file_stem(&wav_path)?;

        let lock = self.stem_lock(&stem);
        let _guard = lock.lock();

        if wav_path.exists() {
            info!(wav = %wav_path.display(), "reusing existing wav");
        } else {
            self.transcoder.to_wav(&downloaded, &wav_path)?;
        }

        let out_dir = self.config.out_root.join(&stem);
        self.split_wav(&wav_path, &out_dir)
    }

    /// Segment a local WAV file and export its chunks into `out_dir`.
    ///
    /// # Errors
    /// Any core or export error for this file.
    pub fn split_wav(&self, wav_path: &Path, out_dir: &Path) -> Result<ExportedSource> {
        let stem = file_stem(wav_path)?;
        let waveform = read_wav_mono(wav_path)?;
        let plan = self.segmenter.plan(&waveform)?;
        let chunks = export_plan(self.exporter.as_ref(), &plan, &waveform, out_dir, &stem)?;

        let exported_ms = plan.total_chunk_ms();
        self.diagnostics
            .chunks_exported
            .fetch_add(chunks.len(), Ordering::Relaxed);
        self.diagnostics
            .exported_ms
            .fetch_add(exported_ms, Ordering::Relaxed);

        Ok(ExportedSource {
            output_dir: out_dir.to_path_buf(),
            chunks,
            exported_ms,
        })
    }

    fn stem_lock(&self, stem: &str) -> Arc<Mutex<()>> {
        let mut locks = self.stem_locks.lock();
        Arc::clone(locks.entry(stem.to_string()).or_default())
    }
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            SpeechcutError::Other(anyhow::anyhow!("no file stem in {}", path.display()))
        })
}
