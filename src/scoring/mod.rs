//! Scoring - continuous accuracy and discrete association matching
//!
//! ## Policies
//!
//! ```text
//! continuous:  accuracy = max(0, 100 - |true - measured| * 20)
//!              score    = round(sum(accuracy) / attempts), clamped to [0, 100]
//!
//! identify:    score    = round(correct / total * 100)
//! ```
//!
//! Attempts count every completed measurement, including repeats on an
//! already measured solution.

pub mod grade;

use serde::{Deserialize, Serialize};

use crate::catalog::SolutionCatalog;
use crate::experiment::Association;

pub use grade::{Grade, ScoreBand};

/// Maximum score of any policy.
pub const MAX_SCORE: u8 = 100;

/// Accuracy points lost per pH unit of error.
pub const PENALTY_PER_PH: f64 = 20.0;

/// Accuracy of one reading, in `[0, 100]`.
///
/// Monotonically decreasing in `|true_ph - measured_ph|`.
#[must_use]
pub fn accuracy(true_ph: f64, measured_ph: f64) -> f64 {
    (100.0 - (true_ph - measured_ph).abs() * PENALTY_PER_PH).max(0.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}

/// Running accuracy total for continuous mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBoard {
    score_sum: f64,
    attempts: u32,
}

impl ScoreBoard {
    /// Empty board.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score_sum: 0.0,
            attempts: 0,
        }
    }

    /// Record one attempt; returns its accuracy.
    pub fn record(&mut self, true_ph: f64, measured_ph: f64) -> f64 {
        let acc = accuracy(true_ph, measured_ph);
        self.score_sum += acc;
        self.attempts += 1;
        acc
    }

    /// Sum of all accuracies so far.
    #[must_use]
    pub const fn score_sum(&self) -> f64 {
        self.score_sum
    }

    /// Number of attempts, repeats included.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Average accuracy, `None` before the first attempt.
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        (self.attempts > 0).then(|| self.score_sum / f64::from(self.attempts))
    }

    /// Rounded average in `[0, 100]`; 0 before the first attempt.
    #[must_use]
    pub fn score(&self) -> u8 {
        self.average().map_or(0, to_score)
    }
}

/// Outcome of matching associations against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationScore {
    /// Associations whose guess equals the solution name
    pub correct: usize,
    /// Number of letters scored
    pub total: usize,
}

impl AssociationScore {
    /// `round(correct / total * 100)`; 0 for an empty set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        to_score(self.correct as f64 / self.total as f64 * 100.0)
    }
}

/// Match each association's guess against the catalog's name for its letter.
///
/// A guess is correct only on an exact name match. Letters unknown to the
/// catalog and empty guesses count as incorrect.
#[must_use]
pub fn score_associations(associations: &[Association], catalog: &SolutionCatalog) -> AssociationScore {
    let correct = associations
        .iter()
        .filter(|a| {
            match (catalog.by_letter(a.letter()), a.guessed_name()) {
                (Ok(solution), Some(guess)) => solution.name() == guess,
                _ => false,
            }
        })
        .count();

    AssociationScore {
        correct,
        total: associations.len(),
    }
}

/// Final result of a session, by policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ScoreReport {
    /// Accuracy lab
    #[serde(rename_all = "camelCase")]
    Continuous {
        /// Final score
        score: u8,
        /// Distinct solutions measured
        measurements: usize,
        /// Attempts, repeats included
        attempts: u32,
    },
    /// Identification lab
    #[serde(rename_all = "camelCase")]
    Identify {
        /// Final score
        score: u8,
        /// Distinct solutions measured
        measurements: usize,
        /// Correct associations
        correct: usize,
        /// Letters scored
        total: usize,
    },
}

impl ScoreReport {
    /// Build a continuous-mode report.
    #[must_use]
    pub fn continuous(board: &ScoreBoard, measurements: usize) -> Self {
        Self::Continuous {
            score: board.score(),
            measurements,
            attempts: board.attempts(),
        }
    }

    /// Build an identify-mode report.
    #[must_use]
    pub fn identify(result: AssociationScore, measurements: usize) -> Self {
        Self::Identify {
            score: result.score(),
            measurements,
            correct: result.correct,
            total: result.total,
        }
    }

    /// Final score in `[0, 100]`.
    #[must_use]
    pub const fn score(&self) -> u8 {
        match self {
            Self::Continuous { score, .. } | Self::Identify { score, .. } => *score,
        }
    }

    /// Always 100.
    #[must_use]
    pub const fn max_score(&self) -> u8 {
        MAX_SCORE
    }

    /// Distinct solutions measured during the session.
    #[must_use]
    pub const fn measurements(&self) -> usize {
        match self {
            Self::Continuous { measurements, .. } | Self::Identify { measurements, .. } => {
                *measurements
            }
        }
    }

    /// Feedback tier for the final score.
    #[must_use]
    pub fn grade(&self) -> Grade {
        Grade::from_score(f64::from(self.score()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_formula() {
        assert!((accuracy(2.0, 2.1) - 98.0).abs() < 1e-9);
        assert!((accuracy(7.0, 7.0) - 100.0).abs() < f64::EPSILON);
        assert!((accuracy(7.0, 6.5) - 90.0).abs() < 1e-9);
        // Error of 5+ pH units floors at 0
        assert!(accuracy(2.0, 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_board_counts_every_attempt() {
        let mut board = ScoreBoard::new();
        board.record(7.0, 7.0);
        board.record(7.0, 6.5);
        assert_eq!(board.attempts(), 2);
        assert_eq!(board.score(), 95);
    }

    #[test]
    fn test_board_empty_score_is_zero() {
        let board = ScoreBoard::default();
        assert_eq!(board.average(), None);
        assert_eq!(board.score(), 0);
    }

    #[test]
    fn test_board_rounds_half_up() {
        let mut board = ScoreBoard::new();
        board.record(7.0, 7.0); // 100
        board.record(7.0, 7.05); // 99
        // 99.5 rounds away from zero
        assert_eq!(board.score(), 100);
    }

    #[test]
    fn test_association_score_rounding() {
        let result = AssociationScore { correct: 5, total: 7 };
        // 71.43 -> 71
        assert_eq!(result.score(), 71);
        assert_eq!(AssociationScore { correct: 7, total: 7 }.score(), 100);
        assert_eq!(AssociationScore { correct: 0, total: 0 }.score(), 0);
    }

    #[test]
    fn test_score_associations_exact_match() {
        let catalog = SolutionCatalog::builtin();
        let associations = vec![
            Association::guessed('A', "Lemon juice"),
            Association::guessed('B', "bleach"), // case matters
            Association::guessed('C', "Coffee"),
            Association::empty('D'),
        ];
        let result = score_associations(&associations, &catalog);
        assert_eq!(result, AssociationScore { correct: 1, total: 4 });
    }

    #[test]
    fn test_report_accessors() {
        let mut board = ScoreBoard::new();
        board.record(2.0, 2.1);
        let report = ScoreReport::continuous(&board, 1);
        assert_eq!(report.score(), 98);
        assert_eq!(report.max_score(), 100);
        assert_eq!(report.measurements(), 1);
        assert_eq!(report.grade(), Grade::Excellent);
    }
}
