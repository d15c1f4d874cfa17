//! Convoluter CLI application
//!
//! Decodes a WAV file, runs it through the effects pipeline, and
//! writes the processed WAV. All raw flag values are validated into
//! the declared parameter domains before the pipeline is invoked.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use convoluter_core::domain::pipeline::{
    EffectParams, EffectPipeline, EqParams, NoiseSource, PipelineResult, ReverbAlgorithm,
};
use convoluter_core::domain::AmbienceRegistry;
use convoluter_infra::{load_ambience_dir, read_wav, write_wav};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ReverbAlgorithmArg {
    #[default]
    Convolution,
    Delay,
}

impl From<ReverbAlgorithmArg> for ReverbAlgorithm {
    fn from(arg: ReverbAlgorithmArg) -> Self {
        match arg {
            ReverbAlgorithmArg::Convolution => ReverbAlgorithm::Convolution,
            ReverbAlgorithmArg::Delay => ReverbAlgorithm::FeedbackDelay,
        }
    }
}

#[derive(Parser)]
#[command(name = "convoluter")]
#[command(about = "Offline audio effects-chain processor", long_about = None)]
struct Cli {
    /// Input WAV file
    input: PathBuf,

    /// Output WAV file
    output: PathBuf,

    /// TOML preset file with effect parameters (flags override it)
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Low-pass cutoff in Hz (5000 = off)
    #[arg(long)]
    low_pass: Option<u32>,

    /// High-pass cutoff in Hz (20 = off)
    #[arg(long)]
    high_pass: Option<u32>,

    /// Distortion gain (1 = off)
    #[arg(long)]
    distortion: Option<f64>,

    /// Reverb amount (1 = off)
    #[arg(long)]
    reverb: Option<u32>,

    /// Reverb algorithm
    #[arg(long, value_enum)]
    reverb_algorithm: Option<ReverbAlgorithmArg>,

    /// EQ low band gain (1 = neutral)
    #[arg(long)]
    eq_low: Option<f64>,

    /// EQ mid band gain (1 = neutral)
    #[arg(long)]
    eq_mid: Option<f64>,

    /// EQ high band gain (1 = neutral)
    #[arg(long)]
    eq_high: Option<f64>,

    /// Tonal (thump) noise level, 0-40 (0 = off)
    #[arg(long)]
    tonal_noise: Option<u32>,

    /// White noise level, 0-40 (0 = off)
    #[arg(long)]
    white_noise: Option<u32>,

    /// Ambience clip name from the ambience directory
    #[arg(long, requires = "ambience_dir")]
    ambience: Option<String>,

    /// Ambience overlay volume, 0-35
    #[arg(long, default_value_t = 25)]
    ambience_volume: u32,

    /// Require the ambience clip to cover the whole input
    #[arg(long)]
    ambience_strict: bool,

    /// Directory of WAV ambience clips
    #[arg(long)]
    ambience_dir: Option<PathBuf>,

    /// Seed for the randomized stages (default: from entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Print a JSON report of the executed stages to stdout
    #[arg(long)]
    report_json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Merge the preset file (if any) with command-line overrides
    fn effect_params(&self) -> anyhow::Result<EffectParams> {
        let mut params = match &self.preset {
            Some(path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("reading preset {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("parsing preset {}", path.display()))?
            }
            None => EffectParams::default(),
        };

        if let Some(cutoff) = self.low_pass {
            params.low_pass_cutoff_hz = cutoff;
        }
        if let Some(cutoff) = self.high_pass {
            params.high_pass_cutoff_hz = cutoff;
        }
        if let Some(gain) = self.distortion {
            params.distortion_gain = gain;
        }
        if let Some(amount) = self.reverb {
            params.reverb.amount = amount;
        }
        if let Some(algorithm) = self.reverb_algorithm {
            params.reverb.algorithm = algorithm.into();
        }
        params.eq = EqParams {
            low_gain: self.eq_low.unwrap_or(params.eq.low_gain),
            mid_gain: self.eq_mid.unwrap_or(params.eq.mid_gain),
            high_gain: self.eq_high.unwrap_or(params.eq.high_gain),
        };
        if let Some(level) = self.tonal_noise {
            params.noise.push(NoiseSource::Tonal { level });
        }
        if let Some(level) = self.white_noise {
            params.noise.push(NoiseSource::White { level });
        }
        if let Some(name) = &self.ambience {
            params.noise.push(NoiseSource::Ambience {
                name: name.clone(),
                level: self.ambience_volume,
                require_full: self.ambience_strict,
            });
        }

        params
            .validate()
            .context("effect parameters outside their declared domains")?;
        Ok(params)
    }
}

/// Machine-readable run summary for `--report-json`
#[derive(Serialize)]
struct RunReport<'a> {
    executed: Vec<&'a str>,
    samples: usize,
    sample_rate: u32,
    duration_ms: u64,
}

impl<'a> RunReport<'a> {
    fn from_result(result: &'a PipelineResult) -> Self {
        Self {
            executed: result.executed.iter().map(|s| s.name()).collect(),
            samples: result.waveform.len(),
            sample_rate: result.waveform.sample_rate(),
            duration_ms: result.waveform.duration_ms(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let params = cli.effect_params()?;

    let registry = match &cli.ambience_dir {
        Some(dir) => load_ambience_dir(dir)
            .with_context(|| format!("loading ambience clips from {}", dir.display()))?,
        None => AmbienceRegistry::new(),
    };

    let input = read_wav(&cli.input)
        .with_context(|| format!("decoding {}", cli.input.display()))?;
    tracing::info!(
        samples = input.len(),
        sample_rate = input.sample_rate(),
        "input loaded"
    );

    let pipeline = EffectPipeline::new(registry);
    let result = match cli.seed {
        Some(seed) => pipeline.process_seeded(input, &params, seed)?,
        None => pipeline.process(input, &params)?,
    };

    write_wav(&result.waveform, &cli.output)
        .with_context(|| format!("encoding {}", cli.output.display()))?;

    if cli.report_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&RunReport::from_result(&result))?
        );
    }

    Ok(())
}
