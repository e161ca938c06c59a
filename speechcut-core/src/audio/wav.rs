//! WAV loading and writing via `hound`.

use std::path::Path;

use tracing::debug;

use super::Waveform;
use crate::error::{Result, SpeechcutError};

/// Load a WAV file as a mono [`Waveform`].
///
/// Integer PCM is scaled to [-1.0, 1.0]; multi-channel audio is averaged
/// down to mono. The sample rate is kept as-is.
///
/// # Errors
/// - `Wav` if the file cannot be opened or decoded, carrying hound's reason.
/// - `EmptyInput` if the file holds no frames.
pub fn read_wav_mono(path: &Path) -> Result<Waveform> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels,
        bits = spec.bits_per_sample,
        "reading wav"
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    if interleaved.is_empty() {
        return Err(SpeechcutError::EmptyInput);
    }

    let mono = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(Waveform::new(mono, spec.sample_rate))
}

/// Write mono samples as 16-bit PCM WAV, creating parent directories.
pub fn write_wav_pcm16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer.write_sample(v)?;
    }
    writer.finalize()?;
    Ok(())
}
