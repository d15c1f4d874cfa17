//! Waveform buffer and core error kinds
//!
//! A [`Waveform`] owns a mono sequence of signed 16-bit PCM samples
//! tagged with a sample rate. Stages take a waveform by value and
//! return a new (or, at a no-op boundary, the same) waveform; nothing
//! in this crate mutates a caller's buffer in place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the effects engine
#[derive(Debug, Error)]
pub enum AudioError {
    /// A parameter outside its declared domain, or audio material that
    /// cannot satisfy the requested operation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A named resource (ambience clip, preset) is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation cannot be expressed at the waveform's sample rate
    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Lowest representable sample value
pub const SAMPLE_MIN: i16 = i16::MIN;
/// Highest representable sample value
pub const SAMPLE_MAX: i16 = i16::MAX;

/// Clamp a floating-point intermediate to the 16-bit sample range,
/// then truncate to integer.
///
/// Every stage that can produce out-of-range magnitudes funnels its
/// output through this.
#[inline]
#[must_use]
pub fn clamp_sample(value: f64) -> i16 {
    value.clamp(SAMPLE_MIN as f64, SAMPLE_MAX as f64) as i16
}

/// Convert decibels to a linear amplitude factor
#[inline]
#[must_use]
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert a duration in milliseconds to a sample count at the given rate
#[inline]
#[must_use]
pub fn ms_to_samples(ms: u64, sample_rate: u32) -> usize {
    (ms as u128 * sample_rate as u128 / 1000) as usize
}

/// A decoded, uncompressed mono PCM buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waveform {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl Waveform {
    /// Create a waveform from raw samples
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidInput(
                "sample rate must be a positive number of Hz".to_string(),
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a silent waveform of the given duration
    pub fn silence(duration_ms: u64, sample_rate: u32) -> Result<Self> {
        let len = ms_to_samples(duration_ms, sample_rate);
        Self::new(vec![0; len], sample_rate)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds, derived from sample count and rate
    pub fn duration_ms(&self) -> u64 {
        (self.samples.len() as u128 * 1000 / self.sample_rate as u128) as u64
    }

    /// Half the sample rate; band edges must stay below this
    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Replace the sample data, keeping the sample rate
    ///
    /// The replacement must have been derived from this waveform, so
    /// the positive-rate invariant already holds.
    #[must_use]
    pub fn with_samples(&self, samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Additively mix `other` onto this waveform starting at
    /// `offset_samples`, clamping each mixed sample.
    ///
    /// The output length equals `self.len()`; material extending past
    /// the end is discarded.
    #[must_use]
    pub fn overlay(&self, other: &Waveform, offset_samples: usize) -> Self {
        let mut out = self.samples.clone();
        mix_into(&mut out, other.samples(), offset_samples, 1.0);
        self.with_samples(out)
    }
}

/// Additive mix of `src` (scaled by `gain`) into `dst` at `offset`,
/// clamping per sample. Accumulation happens in f64 so intermediate
/// sums cannot overflow the 16-bit range silently.
pub(crate) fn mix_into(dst: &mut [i16], src: &[i16], offset: usize, gain: f64) {
    for (i, &s) in src.iter().enumerate() {
        let Some(slot) = dst.get_mut(offset + i) else {
            break;
        };
        *slot = clamp_sample(*slot as f64 + s as f64 * gain);
    }
}
