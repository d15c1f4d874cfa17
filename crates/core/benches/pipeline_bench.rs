// Performance benchmarks for the effects pipeline
//
// Run with: cargo bench --bench pipeline_bench

use convoluter_core::domain::dsp::*;
use convoluter_core::domain::pipeline::*;
use convoluter_core::domain::Waveform;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SAMPLE_RATE: u32 = 44100;

fn test_signal(seconds: u32) -> Waveform {
    let len = (SAMPLE_RATE * seconds) as usize;
    let samples = (0..len)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            (12000.0 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as i16
        })
        .collect();
    Waveform::new(samples, SAMPLE_RATE).unwrap()
}

fn bench_low_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("low_pass_1s");
    let w = test_signal(1);

    for cutoff in [500_u32, 1000, 2000, 4000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(cutoff), cutoff, |b, &cutoff| {
            b.iter(|| {
                black_box(apply_low_pass(black_box(w.clone()), cutoff).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_distortion(c: &mut Criterion) {
    let w = test_signal(1);

    c.bench_function("distortion_1s", |b| {
        b.iter(|| {
            black_box(apply_distortion(black_box(w.clone()), 3.0));
        });
    });
}

fn bench_reverb_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("reverb_1s");
    let w = test_signal(1);

    for amount in [4_u32, 16, 64].iter() {
        group.bench_with_input(
            BenchmarkId::new("convolution", amount),
            amount,
            |b, &amount| {
                b.iter(|| {
                    black_box(apply_reverb_convolution(
                        black_box(w.clone()),
                        amount as usize,
                    ));
                });
            },
        );
    }

    for amount in [2_u32, 5, 10].iter() {
        group.bench_with_input(
            BenchmarkId::new("feedback_delay", amount),
            amount,
            |b, &amount| {
                b.iter(|| {
                    black_box(apply_reverb_delay(black_box(w.clone()), amount));
                });
            },
        );
    }

    group.finish();
}

fn bench_eq(c: &mut Criterion) {
    let w = test_signal(1);

    c.bench_function("eq_three_band_1s", |b| {
        b.iter(|| {
            black_box(apply_eq(black_box(w.clone()), 2.0, 1.0, 0.5).unwrap());
        });
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let pipeline = EffectPipeline::default();
    let w = test_signal(1);
    let params = EffectParams {
        low_pass_cutoff_hz: 3000,
        high_pass_cutoff_hz: 100,
        distortion_gain: 2.0,
        reverb: ReverbParams {
            algorithm: ReverbAlgorithm::FeedbackDelay,
            amount: 4,
        },
        eq: EqParams {
            low_gain: 2.0,
            mid_gain: 1.0,
            high_gain: 0.5,
        },
        noise: vec![NoiseSource::White { level: 15 }],
    };

    c.bench_function("full_pipeline_1s", |b| {
        b.iter(|| {
            black_box(
                pipeline
                    .process_seeded(black_box(w.clone()), &params, 42)
                    .unwrap(),
            );
        });
    });
}

criterion_group!(
    benches,
    bench_low_pass,
    bench_distortion,
    bench_reverb_algorithms,
    bench_eq,
    bench_full_pipeline
);

criterion_main!(benches);
