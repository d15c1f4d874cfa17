//! Noise and ambience mixing
//!
//! Three interchangeable noise sources can be overlaid onto a target
//! waveform: a synthetic low-frequency tonal thump, broadband white
//! noise, and pre-recorded ambience clips looked up by logical name in
//! an [`AmbienceRegistry`]. Levels follow the `50 - level` decibel
//! attenuation convention, so level 0 is an exact no-op for every
//! source.
//!
//! Sources that randomize (the ambience start offset) draw from an
//! injected [`Rng`], never from a hard-wired global, so runs are
//! reproducible under a fixed seed.

use crate::domain::audio::{clamp_sample, db_to_gain, mix_into, ms_to_samples, AudioError, Waveform};
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, trace};

pub type Result<T> = std::result::Result<T, AudioError>;

/// Declared domains and fixed constants for the noise sources
pub mod params {
    /// Tonal / white / mechanical noise level domain
    pub const NOISE_LEVEL_MAX: u32 = 40;

    /// Ambience overlay volume domain
    pub const AMBIENCE_LEVEL_MAX: u32 = 35;

    /// Attenuation floor: applied gain is `-(50 - level)` dB
    pub const NOISE_FLOOR_DB: f64 = 50.0;

    /// Tonal thump: frequency, burst length, fade ramp, tile interval
    pub const TONAL_FREQ_HZ: f64 = 80.0;
    pub const TONAL_BURST_MS: u64 = 250;
    pub const TONAL_FADE_MS: u64 = 25;
    pub const TONAL_INTERVAL_MS: u64 = 5000;
}

/// Linear gain for a noise level under the `50 - level` dB convention
#[inline]
fn noise_gain(level: u32) -> f64 {
    db_to_gain(-(params::NOISE_FLOOR_DB - level as f64))
}

// ============================================================================
// AMBIENCE REGISTRY
// ============================================================================

/// A named, pre-loaded secondary audio source
///
/// Loaded once at startup, read-only for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbienceClip {
    name: String,
    waveform: Waveform,
}

impl AmbienceClip {
    pub fn new(name: impl Into<String>, waveform: Waveform) -> Self {
        Self {
            name: name.into(),
            waveform,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn waveform(&self) -> &Waveform {
        &self.waveform
    }
}

/// Mapping from logical ambience name to pre-loaded clip
///
/// The pipeline only ever reads from the registry; shared references
/// across concurrent invocations need no locking.
#[derive(Debug, Clone, Default)]
pub struct AmbienceRegistry {
    clips: HashMap<String, AmbienceClip>,
}

impl AmbienceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, clip: AmbienceClip) {
        debug!(name = clip.name(), samples = clip.waveform().len(), "registered ambience clip");
        self.clips.insert(clip.name().to_string(), clip);
    }

    /// Look up a clip by name
    pub fn get(&self, name: &str) -> Result<&AmbienceClip> {
        self.clips
            .get(name)
            .ok_or_else(|| AudioError::NotFound(format!("ambience clip '{name}'")))
    }

    /// Registered names, sorted for stable listings
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

// ============================================================================
// NOISE SOURCES
// ============================================================================

/// Overlay a synthetic low-frequency thump, tiled across the waveform
///
/// A short tone burst with linear fade-in/fade-out is generated once,
/// attenuated by `50 - level` dB, and overlaid at a fixed interval
/// across the full duration of the target. Level 0 is a no-op.
#[must_use]
pub fn apply_tonal_noise(w: Waveform, level: u32) -> Waveform {
    if level == 0 {
        return w;
    }

    trace!(level, "overlaying tonal noise");
    let sample_rate = w.sample_rate();
    let gain = noise_gain(level);
    let burst_len = ms_to_samples(params::TONAL_BURST_MS, sample_rate).max(1);
    let fade_len = ms_to_samples(params::TONAL_FADE_MS, sample_rate).min(burst_len / 2);

    let burst: Vec<i16> = (0..burst_len)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let tone = (2.0 * std::f64::consts::PI * params::TONAL_FREQ_HZ * t).sin();
            let envelope = if fade_len == 0 {
                1.0
            } else if i < fade_len {
                i as f64 / fade_len as f64
            } else if i >= burst_len - fade_len {
                (burst_len - 1 - i) as f64 / fade_len as f64
            } else {
                1.0
            };
            clamp_sample(tone * envelope * gain * i16::MAX as f64)
        })
        .collect();

    let interval = ms_to_samples(params::TONAL_INTERVAL_MS, sample_rate).max(1);
    let mut out = w.samples().to_vec();
    let mut offset = 0;
    while offset < out.len() {
        mix_into(&mut out, &burst, offset, 1.0);
        offset += interval;
    }
    w.with_samples(out)
}

/// Overlay broadband white noise across the full waveform
///
/// Noise is drawn uniformly from the injected RNG, attenuated by
/// `50 - level` dB. Level 0 is a no-op.
#[must_use]
pub fn apply_white_noise<R: Rng>(w: Waveform, level: u32, rng: &mut R) -> Waveform {
    if level == 0 {
        return w;
    }

    trace!(level, "overlaying white noise");
    let gain = noise_gain(level);
    let out = w
        .samples()
        .iter()
        .map(|&s| {
            let noise = rng.gen_range(-1.0_f64..1.0) * i16::MAX as f64 * gain;
            clamp_sample(s as f64 + noise)
        })
        .collect();
    w.with_samples(out)
}

/// Overlay a pre-recorded ambience clip
///
/// When the clip is longer than the target, a uniformly random start
/// offset in `[0, clip_len - target_len]` is drawn from the injected
/// RNG and that sub-range is used. A clip shorter than the target is
/// an error when `require_full` is set (mechanical-noise case);
/// otherwise the clip covers the start of the target only. The clip
/// is attenuated by `50 - level` dB before mixing. Level 0 is a no-op.
pub fn apply_ambience<R: Rng>(
    w: Waveform,
    clip: &AmbienceClip,
    level: u32,
    require_full: bool,
    rng: &mut R,
) -> Result<Waveform> {
    if level == 0 {
        return Ok(w);
    }
    if clip.waveform().sample_rate() != w.sample_rate() {
        return Err(AudioError::InvalidInput(format!(
            "ambience clip '{}' is sampled at {} Hz but the target is {} Hz",
            clip.name(),
            clip.waveform().sample_rate(),
            w.sample_rate()
        )));
    }

    let clip_samples = clip.waveform().samples();
    let segment = if clip_samples.len() < w.len() {
        if require_full {
            return Err(AudioError::InvalidInput(format!(
                "ambience clip '{}' ({} samples) is shorter than the target ({} samples)",
                clip.name(),
                clip_samples.len(),
                w.len()
            )));
        }
        clip_samples
    } else {
        let max_offset = clip_samples.len() - w.len();
        let start = if max_offset == 0 {
            0
        } else {
            rng.gen_range(0..=max_offset)
        };
        trace!(name = clip.name(), start, "ambience start offset");
        &clip_samples[start..start + w.len()]
    };

    let gain = noise_gain(level);
    let mut out = w.samples().to_vec();
    mix_into(&mut out, segment, 0, gain);
    Ok(w.with_samples(out))
}

// ============================================================================
// TESTS
// ============================================================================
