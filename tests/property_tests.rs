//! Property-based tests for ph-lab
//!
//! Following ruchy/trueno/aprender pattern:
//! - Test mathematical invariants
//! - Test data integrity properties
//! - Run with ProptestConfig::with_cases(100)
//! - Must complete in <30 seconds for pre-commit hook

use std::time::Duration;

use proptest::prelude::*;
use ph_lab::catalog::{indicator, Solution, SolutionCatalog};
use ph_lab::experiment::Association;
use ph_lab::scoring::{accuracy, score_associations, AssociationScore, ScoreBoard};
use ph_lab::simulator::{FixedNoise, MeasurementSimulator, RngNoise};

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// pH anywhere on the scale
fn arb_ph() -> impl Strategy<Value = f64> {
    0.0f64..=14.0
}

/// Noise band widths, including the 0.2-0.3 seen in practice
fn arb_amplitude() -> impl Strategy<Value = f64> {
    0.0f64..2.0
}

/// (true, measured) reading pairs
fn arb_readings(max: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    proptest::collection::vec((arb_ph(), arb_ph()), 1..max)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Measurement Simulator Properties
    // ========================================================================

    /// Property: a reading lies within truePH ± δ/2 and on the scale
    #[test]
    fn prop_reading_within_noise_band(
        true_ph in arb_ph(),
        amplitude in arb_amplitude(),
        seed in any::<u64>()
    ) {
        let mut sim = MeasurementSimulator::new(RngNoise::seeded(seed), amplitude, Duration::ZERO);
        for _ in 0..10 {
            let reading = sim.read(true_ph);
            prop_assert!((reading - true_ph).abs() <= amplitude / 2.0 + 1e-12);
            prop_assert!((0.0..=14.0).contains(&reading));
        }
    }

    /// Property: fixed noise is exactly reproducible
    #[test]
    fn prop_fixed_noise_deterministic(
        true_ph in 1.0f64..13.0,
        fraction in -0.5f64..=0.5
    ) {
        let mut sim = MeasurementSimulator::new(FixedNoise::new(fraction), 0.2, Duration::ZERO);
        let expected = true_ph + fraction * 0.2;
        prop_assert!((sim.read(true_ph) - expected).abs() < 1e-12);
    }

    // ========================================================================
    // Continuous Scoring Properties
    // ========================================================================

    /// Property: accuracy stays in [0, 100]
    #[test]
    fn prop_accuracy_bounded(true_ph in arb_ph(), measured in arb_ph()) {
        let acc = accuracy(true_ph, measured);
        prop_assert!((0.0..=100.0).contains(&acc));
    }

    /// Property: accuracy never increases as the error grows
    #[test]
    fn prop_accuracy_monotonic(
        true_ph in arb_ph(),
        small in 0.0f64..7.0,
        extra in 0.0f64..7.0
    ) {
        let closer = accuracy(true_ph, true_ph + small);
        let farther = accuracy(true_ph, true_ph + small + extra);
        prop_assert!(closer >= farther);
    }

    /// Property: the final score is always in [0, 100]
    #[test]
    fn prop_board_score_bounded(readings in arb_readings(30)) {
        let mut board = ScoreBoard::new();
        for (true_ph, measured) in &readings {
            board.record(*true_ph, *measured);
        }
        prop_assert!(board.score() <= 100);
        prop_assert_eq!(board.attempts() as usize, readings.len());
    }

    /// Property: the score is the rounded mean accuracy
    #[test]
    fn prop_board_score_is_rounded_mean(readings in arb_readings(30)) {
        let mut board = ScoreBoard::new();
        let mut sum = 0.0;
        for (true_ph, measured) in &readings {
            sum += board.record(*true_ph, *measured);
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = sum / readings.len() as f64;
        prop_assert!((f64::from(board.score()) - mean).abs() <= 0.5 + 1e-9);
    }

    // ========================================================================
    // Discrete Scoring Properties
    // ========================================================================

    /// Property: discrete score equals round(correct / total * 100)
    #[test]
    fn prop_association_score_formula(total in 1usize..50, correct_seed in 0usize..50) {
        let correct = correct_seed % (total + 1);
        let result = AssociationScore { correct, total };
        #[allow(clippy::cast_precision_loss)]
        let expected = (correct as f64 / total as f64 * 100.0).round();
        prop_assert!((f64::from(result.score()) - expected).abs() < f64::EPSILON);
    }

    /// Property: answering every letter correctly always yields 100
    #[test]
    fn prop_all_correct_is_100(size in 1usize..20) {
        let solutions: Vec<Solution> = (0..size)
            .map(|i| {
                let letter = char::from(b'A' + u8::try_from(i).unwrap());
                #[allow(clippy::cast_precision_loss)]
                let ph = (i as f64 * 0.7) % 14.0;
                Solution::builder(format!("s{i}"), format!("Solution {i}"), ph)
                    .letter(letter)
                    .build()
            })
            .collect();
        let catalog = SolutionCatalog::new(solutions).unwrap();
        let associations: Vec<Association> = catalog
            .all()
            .iter()
            .map(|s| Association::guessed(s.letter().unwrap(), s.name()))
            .collect();

        let result = score_associations(&associations, &catalog);
        prop_assert_eq!(result.correct, size);
        prop_assert_eq!(result.score(), 100);
    }

    // ========================================================================
    // Indicator Properties
    // ========================================================================

    /// Property: lit marks are near the reading, and never more than two
    #[test]
    fn prop_lit_marks_near_reading(ph in arb_ph()) {
        let lit = indicator::highlighted_marks([ph]);
        prop_assert!(lit.len() <= 2);
        for mark in lit {
            prop_assert!((mark.value - ph).abs() < indicator::MARK_RADIUS);
        }
    }
}
