//! Integration tests for the effects pipeline
//!
//! These tests exercise the complete path from WAV files on disk
//! through decoding, the effect stages, and re-encoding, including
//! preset files and ambience clip directories.

use convoluter_core::domain::pipeline::{
    EffectParams, EffectPipeline, EqParams, NoiseSource, PipelineError, ReverbAlgorithm,
    ReverbParams, StageKind,
};
use convoluter_core::domain::{AmbienceRegistry, AudioError, PresetManager, Waveform};
use convoluter_infra::{load_ambience_dir, read_wav, write_wav};
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 44100;

fn sine_wave(frequency: f64, sample_rate: u32, num_samples: usize, amplitude: f64) -> Waveform {
    let samples = (0..num_samples)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * frequency * i as f64 / sample_rate as f64;
            (phase.sin() * amplitude) as i16
        })
        .collect();
    Waveform::new(samples, sample_rate).unwrap()
}

fn rms(samples: &[i16]) -> f64 {
    let sum: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
    (sum / samples.len() as f64).sqrt()
}

// ============================================================================
// PASS-THROUGH AND FILE ROUND TRIPS
// ============================================================================

#[test]
fn test_default_params_round_trip_bit_identical() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");

    let original = sine_wave(440.0, SAMPLE_RATE, SAMPLE_RATE as usize, 12000.0);
    write_wav(&original, &input_path).unwrap();

    let decoded = read_wav(&input_path).unwrap();
    assert_eq!(decoded, original);

    let pipeline = EffectPipeline::default();
    let result = pipeline
        .process_seeded(decoded, &EffectParams::default(), 0)
        .unwrap();
    assert!(result.executed.is_empty());

    write_wav(&result.waveform, &output_path).unwrap();
    assert_eq!(read_wav(&output_path).unwrap(), original);
}

#[test]
fn test_distortion_clamps_through_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hot.wav");

    let mut samples = vec![0_i16; 256];
    samples[7] = 20000;
    samples[8] = -20000;
    write_wav(&Waveform::new(samples, SAMPLE_RATE).unwrap(), &path).unwrap();

    let params = EffectParams {
        distortion_gain: 5.0,
        ..Default::default()
    };
    let result = EffectPipeline::default()
        .process_seeded(read_wav(&path).unwrap(), &params, 0)
        .unwrap();

    // Saturates at the sample bounds instead of wrapping.
    assert_eq!(result.waveform.samples()[7], 32767);
    assert_eq!(result.waveform.samples()[8], -32768);
}

// ============================================================================
// FULL CHAIN
// ============================================================================

#[test]
fn test_full_chain_stage_order_and_length() {
    let mut registry = AmbienceRegistry::new();
    registry.insert(convoluter_core::domain::noise::AmbienceClip::new(
        "room",
        sine_wave(60.0, SAMPLE_RATE, SAMPLE_RATE as usize * 2, 4000.0),
    ));
    let pipeline = EffectPipeline::new(registry);

    let input = sine_wave(440.0, SAMPLE_RATE, SAMPLE_RATE as usize, 12000.0);
    let input_len = input.len();

    let params = EffectParams {
        low_pass_cutoff_hz: 2000,
        high_pass_cutoff_hz: 100,
        distortion_gain: 2.0,
        reverb: ReverbParams {
            algorithm: ReverbAlgorithm::Convolution,
            amount: 8,
        },
        eq: EqParams {
            low_gain: 1.5,
            mid_gain: 1.0,
            high_gain: 0.5,
        },
        noise: vec![
            NoiseSource::White { level: 15 },
            NoiseSource::Ambience {
                name: "room".to_string(),
                level: 25,
                require_full: false,
            },
        ],
    };

    let result = pipeline.process_seeded(input, &params, 7).unwrap();
    assert_eq!(result.waveform.len(), input_len);
    assert_eq!(
        result.executed,
        vec![
            StageKind::LowPass,
            StageKind::HighPass,
            StageKind::Distortion,
            StageKind::Reverb,
            StageKind::Equalizer,
            StageKind::Noise,
        ]
    );
}

#[test]
fn test_low_pass_attenuates_high_tone_end_to_end() {
    let input = sine_wave(8000.0, SAMPLE_RATE, SAMPLE_RATE as usize, 16000.0);
    let before = rms(input.samples());

    let params = EffectParams {
        low_pass_cutoff_hz: 500,
        ..Default::default()
    };
    let result = EffectPipeline::default()
        .process_seeded(input, &params, 0)
        .unwrap();

    assert!(rms(result.waveform.samples()) < before * 0.1);
}

#[test]
fn test_delay_reverb_echo_train() {
    // At a 1 kHz rate an amount of 3 gives a 333 ms base delay, so
    // echoes land at samples 333, 666, and 1332.
    let mut samples = vec![0_i16; 2000];
    samples[0] = 32000;
    let input = Waveform::new(samples, 1000).unwrap();

    let params = EffectParams {
        reverb: ReverbParams {
            algorithm: ReverbAlgorithm::FeedbackDelay,
            amount: 3,
        },
        ..Default::default()
    };
    let result = EffectPipeline::default()
        .process_seeded(input, &params, 0)
        .unwrap();
    let out = result.waveform.samples();

    assert_eq!(out[0], 32000);
    let echoes = [out[333], out[666], out[1332]];
    assert!(echoes.iter().all(|&e| e > 0));
    assert!(echoes[0] > echoes[1] && echoes[1] > echoes[2]);
    // No energy anywhere else.
    for (i, &s) in out.iter().enumerate() {
        if ![0, 333, 666, 1332].contains(&i) {
            assert_eq!(s, 0, "unexpected energy at sample {i}");
        }
    }
}

// ============================================================================
// PRESETS
// ============================================================================

#[test]
fn test_preset_file_drives_pipeline() {
    let dir = TempDir::new().unwrap();
    let manager = PresetManager::new(dir.path().to_path_buf());

    let params = EffectParams {
        low_pass_cutoff_hz: 1500,
        distortion_gain: 3.0,
        reverb: ReverbParams {
            algorithm: ReverbAlgorithm::Convolution,
            amount: 16,
        },
        ..Default::default()
    };
    manager.save_preset("crunchy", &params).unwrap();
    let loaded = manager.load_preset("crunchy").unwrap();
    assert_eq!(loaded, params);

    let input = sine_wave(440.0, SAMPLE_RATE, 4410, 12000.0);
    let pipeline = EffectPipeline::default();
    let direct = pipeline.process_seeded(input.clone(), &params, 3).unwrap();
    let via_preset = pipeline.process_seeded(input, &loaded, 3).unwrap();
    assert_eq!(direct.waveform, via_preset.waveform);
}

// ============================================================================
// AMBIENCE DIRECTORIES
// ============================================================================

#[test]
fn test_ambience_directory_end_to_end() {
    let dir = TempDir::new().unwrap();
    let clips = dir.path().join("clips");
    std::fs::create_dir(&clips).unwrap();

    let long_clip = sine_wave(120.0, SAMPLE_RATE, SAMPLE_RATE as usize * 3, 6000.0);
    write_wav(&long_clip, clips.join("traffic.wav")).unwrap();

    let registry = load_ambience_dir(&clips).unwrap();
    assert_eq!(registry.names(), vec!["traffic"]);
    let pipeline = EffectPipeline::new(registry);

    let input = Waveform::silence(1000, SAMPLE_RATE).unwrap();
    let params = EffectParams {
        noise: vec![NoiseSource::Ambience {
            name: "traffic".to_string(),
            level: 30,
            require_full: false,
        }],
        ..Default::default()
    };

    let a = pipeline.process_seeded(input.clone(), &params, 99).unwrap();
    let b = pipeline.process_seeded(input.clone(), &params, 99).unwrap();
    assert_eq!(a.waveform, b.waveform);
    assert_eq!(a.executed, vec![StageKind::Noise]);
    assert_ne!(a.waveform, input);
}

#[test]
fn test_strict_ambience_shorter_clip_aborts() {
    let dir = TempDir::new().unwrap();
    let short_clip = sine_wave(120.0, SAMPLE_RATE, 100, 6000.0);
    write_wav(&short_clip, dir.path().join("blip.wav")).unwrap();

    let registry = load_ambience_dir(dir.path()).unwrap();
    let pipeline = EffectPipeline::new(registry);

    let input = Waveform::silence(1000, SAMPLE_RATE).unwrap();
    let params = EffectParams {
        noise: vec![NoiseSource::Ambience {
            name: "blip".to_string(),
            level: 30,
            require_full: true,
        }],
        ..Default::default()
    };

    assert!(matches!(
        pipeline.process_seeded(input, &params, 0),
        Err(PipelineError::Stage {
            stage: StageKind::Noise,
            source: AudioError::InvalidInput(_),
        })
    ));
}

#[test]
fn test_ambience_sample_rate_mismatch_aborts() {
    let mut registry = AmbienceRegistry::new();
    registry.insert(convoluter_core::domain::noise::AmbienceClip::new(
        "slow",
        sine_wave(120.0, 22050, 22050, 6000.0),
    ));
    let pipeline = EffectPipeline::new(registry);

    let input = Waveform::silence(100, SAMPLE_RATE).unwrap();
    let params = EffectParams {
        noise: vec![NoiseSource::Ambience {
            name: "slow".to_string(),
            level: 30,
            require_full: false,
        }],
        ..Default::default()
    };

    assert!(matches!(
        pipeline.process_seeded(input, &params, 0),
        Err(PipelineError::Stage {
            stage: StageKind::Noise,
            source: AudioError::InvalidInput(_),
        })
    ));
}
