//! Pipeline orchestrator
//!
//! Applies the effect stages in a fixed order — low-pass → high-pass →
//! distortion → reverb → equalizer → noise mixing — over a single
//! waveform. Stages sitting at their no-op boundary are skipped and
//! not recorded as executed. The first stage failure aborts the whole
//! pipeline; there is no partial output.

use crate::domain::audio::{AudioError, Waveform};
use crate::domain::dsp::{
    apply_distortion, apply_eq, apply_high_pass, apply_low_pass, apply_reverb_convolution,
    apply_reverb_delay, params as dsp_params,
};
use crate::domain::noise::{
    apply_ambience, apply_tonal_noise, apply_white_noise, params as noise_params, AmbienceRegistry,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// The pipeline stages, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    LowPass,
    HighPass,
    Distortion,
    Reverb,
    Equalizer,
    Noise,
}

impl StageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::LowPass => "low-pass",
            StageKind::HighPass => "high-pass",
            StageKind::Distortion => "distortion",
            StageKind::Reverb => "reverb",
            StageKind::Equalizer => "equalizer",
            StageKind::Noise => "noise",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors surfaced by a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A parameter failed validation before any stage ran
    #[error("invalid parameters: {0}")]
    InvalidParams(#[source] AudioError),

    /// A stage failed; the pipeline aborted without output
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: AudioError,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Which reverb algorithm the reverb stage runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverbAlgorithm {
    /// Moving-average convolution smear
    #[default]
    Convolution,
    /// Overlay-with-decay echo train
    FeedbackDelay,
}

/// Reverb stage parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbParams {
    pub algorithm: ReverbAlgorithm,
    /// Kernel length (convolution) or echo count (feedback delay);
    /// 1 is the no-op boundary for both
    pub amount: u32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            algorithm: ReverbAlgorithm::default(),
            amount: dsp_params::REVERB_MIN,
        }
    }
}

impl ReverbParams {
    fn max_amount(&self) -> u32 {
        match self.algorithm {
            ReverbAlgorithm::Convolution => dsp_params::REVERB_CONVOLUTION_MAX,
            ReverbAlgorithm::FeedbackDelay => dsp_params::REVERB_DELAY_MAX,
        }
    }
}

/// Equalizer stage parameters; unity on all bands is neutral
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqParams {
    pub low_gain: f64,
    pub mid_gain: f64,
    pub high_gain: f64,
}

impl Default for EqParams {
    fn default() -> Self {
        Self {
            low_gain: 1.0,
            mid_gain: 1.0,
            high_gain: 1.0,
        }
    }
}

impl EqParams {
    pub fn is_unity(&self) -> bool {
        self.low_gain == 1.0 && self.mid_gain == 1.0 && self.high_gain == 1.0
    }
}

/// One noise source to overlay after the tonal stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NoiseSource {
    /// Synthetic low-frequency thump, tiled across the waveform
    Tonal { level: u32 },
    /// Broadband white noise across the full duration
    White { level: u32 },
    /// Pre-recorded clip from the ambience registry
    Ambience {
        name: String,
        level: u32,
        /// Reject clips shorter than the target (mechanical-noise case)
        #[serde(default)]
        require_full: bool,
    },
}

impl NoiseSource {
    fn level(&self) -> u32 {
        match self {
            NoiseSource::Tonal { level }
            | NoiseSource::White { level }
            | NoiseSource::Ambience { level, .. } => *level,
        }
    }
}

/// The single versioned parameter record for one pipeline invocation
///
/// Every parameter has a declared numeric range (see
/// [`crate::domain::dsp::params`] and [`crate::domain::noise::params`]);
/// [`EffectParams::validate`] rejects out-of-domain values before any
/// stage runs. The default record is a full pass-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParams {
    pub low_pass_cutoff_hz: u32,
    pub high_pass_cutoff_hz: u32,
    pub distortion_gain: f64,
    pub reverb: ReverbParams,
    pub eq: EqParams,
    pub noise: Vec<NoiseSource>,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            low_pass_cutoff_hz: dsp_params::LOW_PASS_NOOP_HZ,
            high_pass_cutoff_hz: dsp_params::HIGH_PASS_NOOP_HZ,
            distortion_gain: dsp_params::DISTORTION_MIN,
            reverb: ReverbParams::default(),
            eq: EqParams::default(),
            noise: Vec::new(),
        }
    }
}

impl EffectParams {
    /// Check every parameter against its declared domain
    pub fn validate(&self) -> std::result::Result<(), AudioError> {
        if self.low_pass_cutoff_hz < dsp_params::LOW_PASS_MIN_HZ
            || self.low_pass_cutoff_hz > dsp_params::LOW_PASS_NOOP_HZ
        {
            return Err(AudioError::InvalidInput(format!(
                "low-pass cutoff {} Hz outside [{}, {}]",
                self.low_pass_cutoff_hz,
                dsp_params::LOW_PASS_MIN_HZ,
                dsp_params::LOW_PASS_NOOP_HZ
            )));
        }
        if self.high_pass_cutoff_hz < dsp_params::HIGH_PASS_NOOP_HZ
            || self.high_pass_cutoff_hz > dsp_params::HIGH_PASS_MAX_HZ
        {
            return Err(AudioError::InvalidInput(format!(
                "high-pass cutoff {} Hz outside [{}, {}]",
                self.high_pass_cutoff_hz,
                dsp_params::HIGH_PASS_NOOP_HZ,
                dsp_params::HIGH_PASS_MAX_HZ
            )));
        }
        if self.distortion_gain < dsp_params::DISTORTION_MIN
            || self.distortion_gain > dsp_params::DISTORTION_MAX
        {
            return Err(AudioError::InvalidInput(format!(
                "distortion gain {} outside [{}, {}]",
                self.distortion_gain,
                dsp_params::DISTORTION_MIN,
                dsp_params::DISTORTION_MAX
            )));
        }
        if self.reverb.amount < dsp_params::REVERB_MIN
            || self.reverb.amount > self.reverb.max_amount()
        {
            return Err(AudioError::InvalidInput(format!(
                "reverb amount {} outside [{}, {}] for {:?}",
                self.reverb.amount,
                dsp_params::REVERB_MIN,
                self.reverb.max_amount(),
                self.reverb.algorithm
            )));
        }
        for gain in [self.eq.low_gain, self.eq.mid_gain, self.eq.high_gain] {
            if gain < dsp_params::EQ_GAIN_MIN || gain > dsp_params::EQ_GAIN_MAX {
                return Err(AudioError::InvalidInput(format!(
                    "EQ band gain {} outside [{}, {}]",
                    gain,
                    dsp_params::EQ_GAIN_MIN,
                    dsp_params::EQ_GAIN_MAX
                )));
            }
        }
        for source in &self.noise {
            let max = match source {
                NoiseSource::Ambience { name, .. } => {
                    if name.is_empty() {
                        return Err(AudioError::InvalidInput(
                            "ambience source with empty name".to_string(),
                        ));
                    }
                    noise_params::AMBIENCE_LEVEL_MAX
                }
                _ => noise_params::NOISE_LEVEL_MAX,
            };
            if source.level() > max {
                return Err(AudioError::InvalidInput(format!(
                    "noise level {} outside [0, {max}]",
                    source.level()
                )));
            }
        }
        Ok(())
    }
}

/// Final processed waveform plus a record of the stages that actually
/// executed (no-op stages are absent)
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResult {
    pub waveform: Waveform,
    pub executed: Vec<StageKind>,
}

/// The effects pipeline: a fixed stage order over a shared, read-only
/// ambience registry
///
/// Each invocation is single-threaded and synchronous and owns its
/// waveform, so independent invocations may run concurrently against
/// the same pipeline.
#[derive(Debug, Clone, Default)]
pub struct EffectPipeline {
    registry: AmbienceRegistry,
}

impl EffectPipeline {
    pub fn new(registry: AmbienceRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AmbienceRegistry {
        &self.registry
    }

    /// Process a waveform with a random seed drawn from entropy
    pub fn process(&self, waveform: Waveform, params: &EffectParams) -> Result<PipelineResult> {
        self.process_seeded(waveform, params, rand::random())
    }

    /// Process a waveform with an explicit seed
    ///
    /// All randomized choices (ambience start offsets, white noise)
    /// draw from a single ChaCha8 stream seeded here, so identical
    /// inputs and seed yield identical output.
    pub fn process_seeded(
        &self,
        waveform: Waveform,
        params: &EffectParams,
        seed: u64,
    ) -> Result<PipelineResult> {
        params.validate().map_err(PipelineError::InvalidParams)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut executed = Vec::new();
        let mut w = waveform;

        if params.low_pass_cutoff_hz < dsp_params::LOW_PASS_NOOP_HZ {
            w = apply_low_pass(w, params.low_pass_cutoff_hz).map_err(stage(StageKind::LowPass))?;
            executed.push(StageKind::LowPass);
        }

        if params.high_pass_cutoff_hz > dsp_params::HIGH_PASS_NOOP_HZ {
            w = apply_high_pass(w, params.high_pass_cutoff_hz)
                .map_err(stage(StageKind::HighPass))?;
            executed.push(StageKind::HighPass);
        }

        if params.distortion_gain != 1.0 {
            w = apply_distortion(w, params.distortion_gain);
            executed.push(StageKind::Distortion);
        }

        if params.reverb.amount > dsp_params::REVERB_MIN {
            w = match params.reverb.algorithm {
                ReverbAlgorithm::Convolution => {
                    apply_reverb_convolution(w, params.reverb.amount as usize)
                }
                ReverbAlgorithm::FeedbackDelay => apply_reverb_delay(w, params.reverb.amount),
            };
            executed.push(StageKind::Reverb);
        }

        if !params.eq.is_unity() {
            w = apply_eq(w, params.eq.low_gain, params.eq.mid_gain, params.eq.high_gain)
                .map_err(stage(StageKind::Equalizer))?;
            executed.push(StageKind::Equalizer);
        }

        let mut noise_applied = false;
        for source in &params.noise {
            if source.level() == 0 {
                continue;
            }
            w = match source {
                NoiseSource::Tonal { level } => apply_tonal_noise(w, *level),
                NoiseSource::White { level } => apply_white_noise(w, *level, &mut rng),
                NoiseSource::Ambience {
                    name,
                    level,
                    require_full,
                } => {
                    let clip = self.registry.get(name).map_err(stage(StageKind::Noise))?;
                    apply_ambience(w, clip, *level, *require_full, &mut rng)
                        .map_err(stage(StageKind::Noise))?
                }
            };
            debug!(source = ?source, "noise source applied");
            noise_applied = true;
        }
        if noise_applied {
            executed.push(StageKind::Noise);
        }

        info!(
            stages = executed.len(),
            samples = w.len(),
            "pipeline finished"
        );
        Ok(PipelineResult {
            waveform: w,
            executed,
        })
    }
}

fn stage(kind: StageKind) -> impl FnOnce(AudioError) -> PipelineError {
    move |source| PipelineError::Stage {
        stage: kind,
        source,
    }
}

// ============================================================================
// TESTS
// ============================================================================
