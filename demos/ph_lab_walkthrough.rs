//! pH Lab Walkthrough
//!
//! Runs one measurement-accuracy session and one identification session
//! against the built-in catalog, printing readings, scores and the
//! completion event the hosting page would receive.
//!
//! Run with: cargo run --example ph_lab_walkthrough
//! Verbose:  RUST_LOG=ph_lab=debug cargo run --example ph_lab_walkthrough

use std::sync::Arc;
use std::time::Duration;

use ph_lab::catalog::{indicator, SolutionCatalog};
use ph_lab::experiment::{ExperimentConfig, ExperimentEngine, Mode, Phase};
use ph_lab::notify::{ChannelSink, TracingSink};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== pH Lab Walkthrough ===\n");

    let catalog = Arc::new(SolutionCatalog::builtin());

    // -------------------------------------------------------------------------
    // 1. Continuous mode: measure five solutions as precisely as possible
    // -------------------------------------------------------------------------
    println!("1. Measurement accuracy session...");

    let config = ExperimentConfig::builder(Mode::Continuous)
        .measurement_delay(Duration::from_millis(200))
        .seed(42)
        .build();
    let (sink, mut events) = ChannelSink::new();
    let engine = ExperimentEngine::new(Arc::clone(&catalog), config, Arc::new(sink))?;

    engine.start()?;
    for id in ["lemon", "bleach", "water", "baking-soda", "coffee"] {
        engine.select_solution(id)?;
        let session = engine.settled().await;
        if let Some(m) = session.measurement_for(id) {
            println!(
                "   {:<12} pH {:>5.2}  strip {}  accuracy {:>5.1}",
                id,
                m.measured_ph(),
                m.strip_color(),
                m.accuracy().unwrap_or_default()
            );
        }
    }

    let lit: Vec<_> = indicator::highlighted_marks(engine.measurements().iter().map(|m| m.measured_ph()))
        .into_iter()
        .map(|mark| mark.label)
        .collect();
    println!("   Lit scale marks: {}", lit.join(", "));

    if let Some(report) = engine.final_report() {
        println!("   Score: {}/{}", report.score(), report.max_score());
        println!("   {}", report.grade().message());
    }
    if let Some(event) = events.recv().await {
        println!("   Completion event: {}", event.to_json()?);
    }

    // -------------------------------------------------------------------------
    // 2. Identify mode: measure every mystery beaker, then name them
    // -------------------------------------------------------------------------
    println!("\n2. Identification session...");

    let config = ExperimentConfig::builder(Mode::Identify)
        .measurement_delay(Duration::from_millis(100))
        .seed(7)
        .build();
    let engine = ExperimentEngine::new(Arc::clone(&catalog), config, Arc::new(TracingSink))?;

    engine.start()?;
    for solution in catalog.all() {
        engine.select_solution(solution.id())?;
        engine.settled().await;
    }
    assert_eq!(engine.phase(), Phase::Associating);

    // Guess by matching each reading to the closest known pH; swap the last
    // two guesses to show partial credit.
    let readings = engine.measurements();
    let mut guesses = Vec::new();
    for solution in catalog.all() {
        let Some(letter) = solution.letter() else { continue };
        let Some(reading) = readings.iter().find(|m| m.solution_id() == solution.id()) else {
            continue;
        };
        let closest = catalog
            .all()
            .iter()
            .min_by(|a, b| {
                let da = (a.true_ph() - reading.measured_ph()).abs();
                let db = (b.true_ph() - reading.measured_ph()).abs();
                da.total_cmp(&db)
            })
            .map(|s| s.name().to_string())
            .unwrap_or_default();
        guesses.push((letter, closest));
    }
    let n = guesses.len();
    if n >= 2 {
        let (left, right) = (guesses[n - 2].1.clone(), guesses[n - 1].1.clone());
        guesses[n - 2].1 = right;
        guesses[n - 1].1 = left;
    }

    for (letter, name) in &guesses {
        println!("   Beaker {letter} -> {name}");
        engine.set_association(*letter, name)?;
    }

    let report = engine.validate()?;
    println!("   Score: {}/{}", report.score(), report.max_score());
    println!("   Phase: {}", engine.phase());

    println!("\n=== Walkthrough complete ===");
    Ok(())
}
