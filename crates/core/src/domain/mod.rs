//! Domain entities and business rules

pub mod audio;
pub mod config;
pub mod dsp;
pub mod noise;
pub mod pipeline;

// Re-export specific items to avoid ambiguous glob imports
pub use audio::{AudioError, Waveform};
pub use config::{ConfigError, PresetManager};
pub use dsp::{
    apply_distortion, apply_eq, apply_high_pass, apply_low_pass, apply_reverb_convolution,
    apply_reverb_delay, BiquadCoeffs, BiquadFilter,
};
pub use noise::{
    apply_ambience, apply_tonal_noise, apply_white_noise, AmbienceClip, AmbienceRegistry,
};
pub use pipeline::{
    EffectParams, EffectPipeline, EqParams, NoiseSource, PipelineError, PipelineResult,
    ReverbAlgorithm, ReverbParams, StageKind,
};
