//! Example demonstrating the effects pipeline and preset system
//!
//! Run with: cargo run --package convoluter-core --example pipeline_demo

use convoluter_core::domain::noise::AmbienceClip;
use convoluter_core::domain::pipeline::{
    EffectParams, EffectPipeline, NoiseSource, ReverbAlgorithm, ReverbParams,
};
use convoluter_core::domain::{AmbienceRegistry, PresetManager, Waveform};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("convoluter_core=debug,info")
        .init();

    println!("=== Convoluter Pipeline Demo ===\n");

    // 1. Build a one-second 440 Hz test tone
    println!("1. Generating a 440 Hz test tone...");
    let sample_rate = 44100_u32;
    let samples: Vec<i16> = (0..sample_rate)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (12000.0 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as i16
        })
        .collect();
    let tone = Waveform::new(samples, sample_rate)?;
    println!("   ✓ {} samples at {} Hz", tone.len(), tone.sample_rate());

    // 2. Register an ambience clip (normally loaded from disk by the app)
    println!("\n2. Registering a synthetic ambience clip...");
    let hum: Vec<i16> = (0..sample_rate * 3)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (3000.0 * (2.0 * std::f64::consts::PI * 60.0 * t).sin()) as i16
        })
        .collect();
    let mut registry = AmbienceRegistry::new();
    registry.insert(AmbienceClip::new("hum", Waveform::new(hum, sample_rate)?));
    println!("   ✓ Registered: {:?}", registry.names());

    // 3. Run the pipeline with a handful of effects
    println!("\n3. Running the pipeline...");
    let params = EffectParams {
        low_pass_cutoff_hz: 2500,
        distortion_gain: 3.0,
        reverb: ReverbParams {
            algorithm: ReverbAlgorithm::FeedbackDelay,
            amount: 4,
        },
        noise: vec![NoiseSource::Ambience {
            name: "hum".to_string(),
            level: 25,
            require_full: false,
        }],
        ..Default::default()
    };

    let pipeline = EffectPipeline::new(registry);
    let result = pipeline.process_seeded(tone, &params, 42)?;
    println!(
        "   ✓ {} samples out; stages executed: {:?}",
        result.waveform.len(),
        result
            .executed
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
    );

    // 4. Save the parameters as a preset and load them back
    println!("\n4. Saving and reloading the preset...");
    let preset_dir = std::env::temp_dir().join("convoluter_demo_presets");
    let manager = PresetManager::new(preset_dir.clone());
    manager.save_preset("demo", &params)?;
    let loaded = manager.load_preset("demo")?;
    assert_eq!(loaded, params);
    println!("   ✓ Preset round-tripped via {}", preset_dir.display());

    manager.delete_preset("demo")?;
    println!("\nDone.");
    Ok(())
}
