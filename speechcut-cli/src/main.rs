//! `speechcut`: cut remote or local recordings into short speech chunks.
//!
//! ```text
//! speechcut run sources.csv --out ./output_chunks --workers 4
//! speechcut split talk.wav --out ./talk_chunks
//! speechcut config --write --max-chunk-s 10
//! ```
//!
//! Settings come from the JSON file (`--config`, or the per-user default),
//! then command-line flags override individual fields.

mod settings;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use settings::{default_settings_path, load_settings, save_settings, Settings};
use speechcut_core::{report::write_report, BatchRunner};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "speechcut=info,speechcut_core=info";
const VERBOSE_LOG_FILTER: &str = "speechcut=debug,speechcut_core=debug";

#[derive(Parser)]
#[command(name = "speechcut", version, about = "Cut recordings into 3-8 s speech chunks")]
struct Cli {
    /// Settings file (default: per-user data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, transcode and segment every URL listed in a CSV file
    Run {
        /// CSV file with a `url` column
        csv: PathBuf,

        /// Scratch directory for downloads and WAV files
        #[arg(long)]
        tmp: Option<PathBuf>,

        /// Root directory for chunk output
        #[arg(long)]
        out: Option<PathBuf>,

        /// Sources processed at once
        #[arg(long)]
        workers: Option<usize>,

        /// Deadline for each yt-dlp / ffmpeg call, in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Write a JSON report of every source's outcome here
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        segmentation: SegmentationArgs,
    },
    /// Segment one local WAV file
    Split {
        wav: PathBuf,

        /// Output directory (default: <out root>/<file stem>)
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        segmentation: SegmentationArgs,
    },
    /// Print the effective settings as JSON
    Config {
        /// Persist the effective settings to the settings file
        #[arg(long)]
        write: bool,

        #[command(flatten)]
        segmentation: SegmentationArgs,
    },
}

#[derive(Args, Default)]
struct SegmentationArgs {
    /// Minimum silence length in ms
    #[arg(long, alias = "min_silence_len")]
    min_silence_len: Option<u64>,

    /// Silence threshold, in dB below the recording's mean level
    #[arg(long, alias = "silence_thresh_delta")]
    silence_thresh_delta: Option<f64>,

    /// Silence kept on each side of a segment, in ms
    #[arg(long, alias = "keep_silence")]
    keep_silence: Option<u64>,

    /// Shortest acceptable chunk, in seconds
    #[arg(long, alias = "min_chunk_s")]
    min_chunk_s: Option<f64>,

    /// Longest acceptable chunk, in seconds
    #[arg(long, alias = "max_chunk_s")]
    max_chunk_s: Option<f64>,
}

impl SegmentationArgs {
    fn apply(&self, settings: &mut Settings) {
        let seg = &mut settings.batch.segmentation;
        if let Some(v) = self.min_silence_len {
            seg.min_silence_ms = v;
        }
        if let Some(v) = self.silence_thresh_delta {
            seg.threshold_delta_db = v;
        }
        if let Some(v) = self.keep_silence {
            seg.keep_silence_ms = v;
        }
        if let Some(v) = self.min_chunk_s {
            seg.min_chunk_s = v;
        }
        if let Some(v) = self.max_chunk_s {
            seg.max_chunk_s = v;
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings_path = cli.config.clone().unwrap_or_else(default_settings_path);
    let mut settings = load_settings(&settings_path)?;

    match cli.command {
        Commands::Run {
            csv,
            tmp,
            out,
            workers,
            timeout,
            report,
            segmentation,
        } => {
            if let Some(tmp) = tmp {
                settings.batch.tmp_dir = tmp;
            }
            if let Some(out) = out {
                settings.batch.out_root = out;
            }
            if let Some(workers) = workers {
                settings.batch.workers = workers;
            }
            if let Some(timeout) = timeout {
                settings.batch.tool_timeout_secs = timeout;
            }
            if report.is_some() {
                settings.report_path = report;
            }
            segmentation.apply(&mut settings);
            run_batch(settings, csv).await
        }
        Commands::Split {
            wav,
            out,
            segmentation,
        } => {
            segmentation.apply(&mut settings);
            split_one(settings, wav, out).await
        }
        Commands::Config {
            write,
            segmentation,
        } => {
            segmentation.apply(&mut settings);
            settings.batch.validate()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if write {
                save_settings(&settings_path, &settings).with_context(|| {
                    format!("failed to write settings to {}", settings_path.display())
                })?;
                info!(path = %settings_path.display(), "settings saved");
            }
            Ok(())
        }
    }
}

async fn run_batch(settings: Settings, csv: PathBuf) -> anyhow::Result<()> {
    let runner = BatchRunner::new(settings.batch)?;
    info!(
        csv = %csv.display(),
        workers = runner.config().workers,
        out = %runner.config().out_root.display(),
        "batch starting"
    );

    let report = runner
        .run_csv(&csv)
        .await
        .with_context(|| format!("failed to read source list {}", csv.display()))?;

    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        chunks = report.chunks_exported(),
        exported_s = report.exported_ms() as f64 / 1000.0,
        "summary"
    );
    for outcome in report.sources.iter().filter(|o| !o.is_success()) {
        warn!(
            url = %outcome.url,
            error = outcome.error.as_deref().unwrap_or("unknown"),
            "source failed"
        );
    }

    if let Some(path) = settings.report_path.as_deref() {
        write_report(path, &report)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    if !report.sources.is_empty() && report.succeeded() == 0 {
        bail!("all {} sources failed", report.sources.len());
    }
    Ok(())
}

async fn split_one(settings: Settings, wav: PathBuf, out: Option<PathBuf>) -> anyhow::Result<()> {
    let runner = BatchRunner::new(settings.batch)?;
    let out_dir = match out {
        Some(dir) => dir,
        None => {
            let stem = wav
                .file_stem()
                .and_then(|s| s.to_str())
                .with_context(|| format!("no usable file name in {}", wav.display()))?;
            runner.config().out_root.join(stem)
        }
    };

    let exported = tokio::task::spawn_blocking({
        let wav = wav.clone();
        move || runner.split_wav(&wav, &out_dir)
    })
    .await?
    .with_context(|| format!("failed to split {}", wav.display()))?;

    info!(
        wav = %wav.display(),
        chunks = exported.chunks.len(),
        exported_s = exported.exported_ms as f64 / 1000.0,
        out = %exported.output_dir.display(),
        "split finished"
    );
    for path in &exported.chunks {
        println!("{}", path.display());
    }
    Ok(())
}
