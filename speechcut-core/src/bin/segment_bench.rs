//! Times the segmentation core over a directory of WAV fixtures.
//!
//! ```text
//! cargo run -p speechcut-core --release --bin segment-bench -- \
//!     --fixtures benchmarks/fixtures --iterations 3 --output report.json
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use serde::Serialize;
use speechcut_core::audio::wav::read_wav_mono;
use speechcut_core::{SegmentationConfig, Segmenter};

#[derive(Parser, Debug)]
#[command(name = "segment-bench")]
#[command(about = "Time silence segmentation over WAV fixtures", long_about = None)]
struct Args {
    /// Directory searched recursively for .wav files
    #[arg(long, default_value = "benchmarks/fixtures")]
    fixtures: PathBuf,
    /// Runs per fixture (1-10)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=10))]
    iterations: u32,
    /// Write the JSON report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CaseResult {
    file: String,
    iteration: u32,
    audio_ms: u64,
    latency_ms: f64,
    silences: usize,
    segments: usize,
    chunks: usize,
    shortest_chunk_ms: Option<u64>,
    longest_chunk_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    fixtures_dir: String,
    iterations: u32,
    total_runs: usize,
    total_files: usize,
    p50_latency_ms: f64,
    p95_latency_ms: f64,
    avg_latency_ms: f64,
    /// Audio milliseconds segmented per wall-clock millisecond.
    realtime_factor: f64,
    cases: Vec<CaseResult>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("segment-bench failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    if !args.fixtures.exists() {
        return Err(format!(
            "fixtures directory not found: {}",
            args.fixtures.display()
        ));
    }

    let mut wav_files = Vec::new();
    collect_wavs(&args.fixtures, &mut wav_files)?;
    wav_files.sort();
    if wav_files.is_empty() {
        return Err(format!(
            "no .wav fixtures found in {}",
            args.fixtures.display()
        ));
    }

    println!(
        "Running segment-bench on {} fixtures (iterations={})",
        wav_files.len(),
        args.iterations
    );

    let segmenter = Segmenter::new(SegmentationConfig::default()).map_err(|e| e.to_string())?;

    let mut cases = Vec::new();
    for wav in &wav_files {
        let waveform = read_wav_mono(wav).map_err(|e| format!("{}: {e}", wav.display()))?;
        let file = wav
            .strip_prefix(&args.fixtures)
            .unwrap_or(wav)
            .display()
            .to_string();

        for iteration in 1..=args.iterations {
            let started = Instant::now();
            let plan = segmenter
                .plan(&waveform)
                .map_err(|e| format!("{}: {e}", wav.display()))?;
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

            let lengths = plan.chunks().iter().map(|c| c.duration_ms);
            cases.push(CaseResult {
                file: file.clone(),
                iteration,
                audio_ms: waveform.duration_ms(),
                latency_ms,
                silences: plan.silences().len(),
                segments: plan.segments().len(),
                chunks: plan.chunks().len(),
                shortest_chunk_ms: lengths.clone().min(),
                longest_chunk_ms: lengths.max(),
            });
            println!(
                "{file} [{iteration}/{iters}] {latency_ms:.1} ms, {n} chunks",
                iters = args.iterations,
                n = plan.chunks().len()
            );
        }
    }

    let latencies = cases.iter().map(|c| c.latency_ms).collect::<Vec<_>>();
    let total_latency: f64 = latencies.iter().sum();
    let total_audio: u64 = cases.iter().map(|c| c.audio_ms).sum();
    let summary = Summary {
        fixtures_dir: args.fixtures.display().to_string(),
        iterations: args.iterations,
        total_runs: cases.len(),
        total_files: wav_files.len(),
        p50_latency_ms: percentile(&latencies, 0.50),
        p95_latency_ms: percentile(&latencies, 0.95),
        avg_latency_ms: if latencies.is_empty() {
            0.0
        } else {
            total_latency / latencies.len() as f64
        },
        realtime_factor: if total_latency > 0.0 {
            total_audio as f64 / total_latency
        } else {
            0.0
        },
        cases,
    };

    println!(
        "Done. runs={} p50={:.1}ms p95={:.1}ms realtime={:.0}x",
        summary.total_runs, summary.p50_latency_ms, summary.p95_latency_ms, summary.realtime_factor
    );

    let json = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
    if let Some(out) = args.output {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        std::fs::write(&out, json).map_err(|e| e.to_string())?;
        println!("Wrote benchmark report: {}", out.display());
    } else {
        println!("{json}");
    }

    Ok(())
}

fn collect_wavs(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries = std::fs::read_dir(dir).map_err(|e| e.to_string())?;
    for entry in entries {
        let path = entry.map_err(|e| e.to_string())?.path();
        if path.is_dir() {
            collect_wavs(&path, out)?;
            continue;
        }
        let is_wav = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if is_wav {
            out.push(path);
        }
    }
    Ok(())
}

fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = ((sorted.len() - 1) as f64 * p.clamp(0.0, 1.0)).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}
