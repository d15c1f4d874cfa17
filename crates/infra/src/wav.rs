//! WAV file decode/encode for the pipeline's waveform buffers
//!
//! Uses `hound`. Input may be 16-bit integer or 32-bit float PCM and
//! any channel count; multi-channel material is downmixed to mono by
//! averaging. Output is always 16-bit mono at the waveform's rate.

use convoluter_core::domain::Waveform;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by the WAV codec
#[derive(Debug, Error)]
pub enum WavError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV codec error: {0}")]
    Codec(#[from] hound::Error),

    #[error("unsupported WAV format: {0}")]
    Unsupported(String),

    #[error("invalid waveform: {0}")]
    InvalidWaveform(String),
}

pub type Result<T> = std::result::Result<T, WavError>;

fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Average interleaved frames down to a single mono track
fn downmix(samples: Vec<i16>, channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return samples;
    }
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Decode a WAV file into a mono [`Waveform`]
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Waveform> {
    let path = path.as_ref();
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    debug!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "decoding WAV"
    );

    let samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| {
                s.map(|v| (v as f64 * i16::MAX as f64).clamp(i16::MIN as f64, i16::MAX as f64) as i16)
            })
            .collect::<std::result::Result<_, _>>()?,
        (format, bits) => {
            return Err(WavError::Unsupported(format!(
                "{bits}-bit {format:?} PCM (expected 16-bit int or 32-bit float)"
            )))
        }
    };

    let mono = downmix(samples, spec.channels as usize);
    info!(path = %path.display(), samples = mono.len(), "WAV decoded");

    Waveform::new(mono, spec.sample_rate).map_err(|e| WavError::InvalidWaveform(e.to_string()))
}

/// Encode a [`Waveform`] as a 16-bit mono WAV file
pub fn write_wav<P: AsRef<Path>>(waveform: &Waveform, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, wav_spec(waveform.sample_rate()))?;
    for &sample in waveform.samples() {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    info!(path = %path.display(), samples = waveform.len(), "WAV written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
