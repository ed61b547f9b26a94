//! Scoring and simulation benchmarks
//!
//! Toyota Way: Genchi Genbutsu (measure, don't guess)
//!
//! Run with: cargo bench --bench scoring_benchmarks

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ph_lab::catalog::SolutionCatalog;
use ph_lab::experiment::{Association, ExperimentConfig, ExperimentEngine, Mode};
use ph_lab::notify::MemorySink;
use ph_lab::scoring::{score_associations, ScoreBoard};
use ph_lab::simulator::{MeasurementSimulator, RngNoise};

const SMALL_SIZE: usize = 1_000;
const LARGE_SIZE: usize = 100_000;

/// Benchmark noisy readings from a seeded simulator
fn bench_readings(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulated_readings");

    for size in [SMALL_SIZE, LARGE_SIZE] {
        group.bench_with_input(BenchmarkId::new("seeded_rng", size), &size, |b, &n| {
            let mut sim = MeasurementSimulator::new(RngNoise::seeded(42), 0.3, Duration::ZERO);
            b.iter(|| {
                let mut last = 0.0;
                for _ in 0..n {
                    last = sim.read(black_box(7.0));
                }
                last
            });
        });
    }

    group.finish();
}

/// Benchmark continuous accuracy accumulation
fn bench_score_board(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_board");

    for size in [SMALL_SIZE, LARGE_SIZE] {
        let readings: Vec<(f64, f64)> = (0..size)
            .map(|i| {
                let true_ph = (i % 15) as f64 * 0.9;
                (true_ph, true_ph + ((i % 7) as f64 - 3.0) * 0.05)
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("record", size), &readings, |b, data| {
            b.iter(|| {
                let mut board = ScoreBoard::new();
                for (true_ph, measured) in black_box(data) {
                    board.record(*true_ph, *measured);
                }
                board.score()
            });
        });
    }

    group.finish();
}

/// Benchmark association matching against the built-in catalog
fn bench_associations(c: &mut Criterion) {
    let catalog = SolutionCatalog::builtin();
    let associations: Vec<Association> = catalog
        .all()
        .iter()
        .filter_map(|s| s.letter().map(|l| Association::guessed(l, s.name())))
        .collect();

    c.bench_function("score_associations_builtin", |b| {
        b.iter(|| score_associations(black_box(&associations), &catalog));
    });
}

/// Benchmark one full continuous session with zero-delay strips
fn bench_full_session(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let catalog = Arc::new(SolutionCatalog::builtin());
    let config = ExperimentConfig::builder(Mode::Continuous)
        .measurement_delay(Duration::ZERO)
        .seed(7)
        .build();
    let (catalog, config) = (&catalog, &config);

    c.bench_function("continuous_session", |b| {
        b.to_async(&runtime).iter(|| async move {
            let engine = ExperimentEngine::new(
                Arc::clone(catalog),
                config.clone(),
                Arc::new(MemorySink::new()),
            )
            .expect("engine");
            engine.start().expect("start");
            for id in ["lemon", "bleach", "water", "coffee", "vinegar"] {
                engine.select_solution(id).expect("select");
                engine.settled().await;
            }
            engine.final_report()
        });
    });
}

criterion_group!(
    benches,
    bench_readings,
    bench_score_board,
    bench_associations,
    bench_full_session
);
criterion_main!(benches);
