//! Digital Signal Processing stages for the effects pipeline
//!
//! This module provides the per-stage transforms:
//! - Low-pass / high-pass filtering (Butterworth-class biquad IIR)
//! - Distortion (hard digital clipping, not analog modeling)
//! - Reverb, as two alternative algorithms: moving-average convolution
//!   and a feedback-delay echo train
//! - 3-band equalizer (band-pass split, per-band gain, recombination)
//!
//! Every stage preserves sample count and sample rate exactly, and
//! every stage that can exceed the 16-bit range clamps its output. A
//! stage called at its no-op boundary returns its input unchanged.

use crate::domain::audio::{clamp_sample, db_to_gain, ms_to_samples, AudioError, Waveform};
use serde::{Deserialize, Serialize};
use tracing::trace;

pub type Result<T> = std::result::Result<T, AudioError>;

/// Declared parameter domains for the pipeline stages
///
/// Callers validate raw input against these before a stage runs;
/// the stages themselves assume pre-validated values.
pub mod params {
    /// Low-pass cutoff domain (Hz); at the ceiling the stage is a no-op
    pub const LOW_PASS_MIN_HZ: u32 = 300;
    pub const LOW_PASS_NOOP_HZ: u32 = 5000;

    /// High-pass cutoff domain (Hz); at the floor the stage is a no-op
    pub const HIGH_PASS_NOOP_HZ: u32 = 20;
    pub const HIGH_PASS_MAX_HZ: u32 = 3000;

    /// Distortion gain domain; 1 is identity
    pub const DISTORTION_MIN: f64 = 1.0;
    pub const DISTORTION_MAX: f64 = 10.0;

    /// Reverb amount domains; 1 is the no-op boundary for both algorithms
    pub const REVERB_MIN: u32 = 1;
    pub const REVERB_DELAY_MAX: u32 = 10;
    pub const REVERB_CONVOLUTION_MAX: u32 = 100;

    /// Per-echo attenuation of the feedback-delay reverb
    pub const ECHO_DECAY_DB: f64 = -6.0;

    /// EQ band gain domain; unity on all three bands is a no-op
    pub const EQ_GAIN_MIN: f64 = 0.0;
    pub const EQ_GAIN_MAX: f64 = 10.0;

    /// Fixed EQ band edges (Hz)
    pub const LOW_BAND_HZ: (f64, f64) = (20.0, 250.0);
    pub const MID_BAND_HZ: (f64, f64) = (250.0, 4000.0);
    pub const HIGH_BAND_HZ: (f64, f64) = (4000.0, 20000.0);
}

// ============================================================================
// BIQUAD FILTER (Low-level IIR filter for the filter and EQ stages)
// ============================================================================

/// Biquad filter coefficients
///
/// Direct Form I implementation for numerical stability.
/// Coefficients are pre-computed to avoid per-sample calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoeffs {
    /// Numerator coefficients
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    /// Denominator coefficients (a0 is normalized to 1.0)
    pub a1: f64,
    pub a2: f64,
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        // Unity gain (no filtering)
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }
}

/// Butterworth Q for the second-order low/high-pass sections
const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

impl BiquadCoeffs {
    /// Calculate coefficients for a low-pass filter
    ///
    /// Attenuates frequencies above the cutoff with a maximally flat
    /// passband (Butterworth response).
    #[must_use]
    pub fn low_pass(sample_rate: f64, cutoff_hz: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * cutoff_hz / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * BUTTERWORTH_Q);

        let b0 = (1.0 - cos_w0) / 2.0;
        let b1 = 1.0 - cos_w0;
        let b2 = (1.0 - cos_w0) / 2.0;

        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Calculate coefficients for a high-pass filter
    #[must_use]
    pub fn high_pass(sample_rate: f64, cutoff_hz: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * cutoff_hz / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * BUTTERWORTH_Q);

        let b0 = (1.0 + cos_w0) / 2.0;
        let b1 = -(1.0 + cos_w0);
        let b2 = (1.0 + cos_w0) / 2.0;

        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Calculate coefficients for a band-pass filter over `[lowcut, highcut]`
    ///
    /// Centre frequency is the geometric mean of the edges; Q is
    /// derived from the bandwidth so the skirts fall at the edges.
    #[must_use]
    pub fn band_pass(sample_rate: f64, lowcut_hz: f64, highcut_hz: f64) -> Self {
        let f0 = (lowcut_hz * highcut_hz).sqrt();
        let q = f0 / (highcut_hz - lowcut_hz);

        let w0 = 2.0 * std::f64::consts::PI * f0 / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        // Constant 0 dB peak gain form
        let b0 = alpha;
        let b1 = 0.0;
        let b2 = -alpha;

        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Stateful biquad filter using Direct Form I
///
/// Direct Form I is chosen over Transposed Direct Form II for better
/// numerical stability with low-frequency filters.
#[derive(Debug, Clone, PartialEq)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    // Previous input samples (x[n-1], x[n-2])
    x1: f64,
    x2: f64,
    // Previous output samples (y[n-1], y[n-2])
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Process a single sample
    #[inline]
    pub fn process_sample(&mut self, x: f64) -> f64 {
        // Direct Form I: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
        //                        - a1*y[n-1] - a2*y[n-2]
        let y = self.coeffs.b0 * x
            + self.coeffs.b1 * self.x1
            + self.coeffs.b2 * self.x2
            - self.coeffs.a1 * self.y1
            - self.coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }

    /// Run the filter over a sample buffer, yielding unclamped
    /// floating-point output
    ///
    /// The EQ stage sums several band outputs before clamping, so
    /// clamping is left to the caller.
    pub fn run(&mut self, samples: &[i16]) -> Vec<f64> {
        samples
            .iter()
            .map(|&s| self.process_sample(s as f64))
            .collect()
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// Run a freshly-designed filter over a waveform, clamping the output
fn filter_waveform(w: &Waveform, coeffs: BiquadCoeffs) -> Waveform {
    let mut filter = BiquadFilter::new(coeffs);
    let out = w
        .samples()
        .iter()
        .map(|&s| clamp_sample(filter.process_sample(s as f64)))
        .collect();
    w.with_samples(out)
}

// ============================================================================
// FILTER STAGE
// ============================================================================

/// Apply a low-pass filter with the given cutoff
///
/// A cutoff at or above the designed 5000 Hz ceiling means "no
/// filtering" and returns the input unchanged.
pub fn apply_low_pass(w: Waveform, cutoff_hz: u32) -> Result<Waveform> {
    if cutoff_hz >= params::LOW_PASS_NOOP_HZ {
        return Ok(w);
    }
    if cutoff_hz as f64 >= w.nyquist() {
        return Err(AudioError::Unsupported(format!(
            "low-pass cutoff {cutoff_hz} Hz is at or above Nyquist ({} Hz)",
            w.nyquist()
        )));
    }

    trace!(cutoff_hz, "applying low-pass filter");
    let coeffs = BiquadCoeffs::low_pass(w.sample_rate() as f64, cutoff_hz as f64);
    Ok(filter_waveform(&w, coeffs))
}

/// Apply a high-pass filter with the given cutoff
///
/// A cutoff at or below the sub-audible 20 Hz floor is a no-op.
pub fn apply_high_pass(w: Waveform, cutoff_hz: u32) -> Result<Waveform> {
    if cutoff_hz <= params::HIGH_PASS_NOOP_HZ {
        return Ok(w);
    }
    if cutoff_hz as f64 >= w.nyquist() {
        return Err(AudioError::Unsupported(format!(
            "high-pass cutoff {cutoff_hz} Hz is at or above Nyquist ({} Hz)",
            w.nyquist()
        )));
    }

    trace!(cutoff_hz, "applying high-pass filter");
    let coeffs = BiquadCoeffs::high_pass(w.sample_rate() as f64, cutoff_hz as f64);
    Ok(filter_waveform(&w, coeffs))
}

// ============================================================================
// DISTORTION STAGE
// ============================================================================

/// Apply distortion: multiply every sample by `gain` and hard-clip
///
/// This is intentional digital distortion (hard clipping at the
/// 16-bit rails), not analog saturation modeling. Identity gain is a
/// no-op.
#[must_use]
pub fn apply_distortion(w: Waveform, gain: f64) -> Waveform {
    if gain == 1.0 {
        return w;
    }

    trace!(gain, "applying distortion");
    let out = w
        .samples()
        .iter()
        .map(|&s| clamp_sample(s as f64 * gain))
        .collect();
    w.with_samples(out)
}

// ============================================================================
// REVERB STAGE
// ============================================================================

/// Apply convolution reverb: smear the signal with a normalized
/// moving-average kernel of length `amount`
///
/// Full convolution truncated to the input length, then clamped.
/// An amount of 1 is a one-tap identity kernel and therefore a no-op.
#[must_use]
pub fn apply_reverb_convolution(w: Waveform, amount: usize) -> Waveform {
    if amount <= 1 {
        return w;
    }

    trace!(amount, "applying convolution reverb");
    let samples = w.samples();
    let kernel_len = amount as f64;

    // Uniform kernel: out[n] is the running mean of the last `amount`
    // inputs, which is exactly full convolution truncated to len.
    let mut sum = 0.0_f64;
    let mut out = Vec::with_capacity(samples.len());
    for n in 0..samples.len() {
        sum += samples[n] as f64;
        if n >= amount {
            sum -= samples[n - amount] as f64;
        }
        out.push(clamp_sample(sum / kernel_len));
    }
    w.with_samples(out)
}

/// Apply feedback-delay reverb: overlay `amount` echoes of the dry
/// signal, each −6 dB quieter than and at double the delay of the
/// previous
///
/// The initial delay is `1000 / amount` milliseconds, so heavier
/// reverb settings produce denser, earlier echo trains. Echoes that
/// fall past the end of the waveform are discarded; length is
/// preserved.
#[must_use]
pub fn apply_reverb_delay(w: Waveform, amount: u32) -> Waveform {
    if amount <= 1 {
        return w;
    }

    trace!(amount, "applying feedback-delay reverb");
    let delay_ms = 1000 / amount as u64;
    let decay = db_to_gain(params::ECHO_DECAY_DB);

    let dry = w.samples().to_vec();
    let mut out = dry.clone();
    let mut offset = ms_to_samples(delay_ms, w.sample_rate());
    let mut gain = decay;

    for _ in 0..amount {
        crate::domain::audio::mix_into(&mut out, &dry, offset, gain);
        offset *= 2;
        gain *= decay;
    }
    w.with_samples(out)
}

// ============================================================================
// EQUALIZER STAGE
// ============================================================================

/// Resolve a band's edges against the waveform's Nyquist limit
///
/// The upper edge is clamped to just below Nyquist (the fixed 20 kHz
/// high-band edge exceeds Nyquist at common rates); a band whose lower
/// edge reaches Nyquist cannot be represented at all.
fn resolve_band(lowcut: f64, highcut: f64, nyquist: f64) -> Result<(f64, f64)> {
    if lowcut >= nyquist {
        return Err(AudioError::Unsupported(format!(
            "band edge {lowcut} Hz is at or above Nyquist ({nyquist} Hz)"
        )));
    }
    Ok((lowcut, highcut.min(nyquist * 0.999)))
}

/// Apply a 3-band equalizer
///
/// The input is split into low/mid/high bands via band-pass filters at
/// fixed edges, each band is scaled by its gain, and the scaled bands
/// are summed sample-by-sample and clamped. Unity gain on all three
/// bands is a no-op.
pub fn apply_eq(w: Waveform, low_gain: f64, mid_gain: f64, high_gain: f64) -> Result<Waveform> {
    if low_gain == 1.0 && mid_gain == 1.0 && high_gain == 1.0 {
        return Ok(w);
    }

    trace!(low_gain, mid_gain, high_gain, "applying equalizer");
    let sample_rate = w.sample_rate() as f64;
    let nyquist = w.nyquist();
    let bands = [
        (params::LOW_BAND_HZ, low_gain),
        (params::MID_BAND_HZ, mid_gain),
        (params::HIGH_BAND_HZ, high_gain),
    ];

    let mut acc = vec![0.0_f64; w.len()];
    for ((lowcut, highcut), gain) in bands {
        let (lowcut, highcut) = resolve_band(lowcut, highcut, nyquist)?;
        let mut filter = BiquadFilter::new(BiquadCoeffs::band_pass(sample_rate, lowcut, highcut));
        let band = filter.run(w.samples());
        for (slot, sample) in acc.iter_mut().zip(band) {
            *slot += sample * gain;
        }
    }

    let out = acc.into_iter().map(clamp_sample).collect();
    Ok(w.with_samples(out))
}

// ============================================================================
// TESTS
// ============================================================================
