//! Experiment session - the state the engine owns and the UI renders
//!
//! Every mutator is crate-private; outside the crate a session is a read-only
//! snapshot handed out by the engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{indicator, Solution};
use crate::scoring::{ScoreBoard, ScoreReport};

/// Identity of one session; a fresh id is issued on every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Phase of the experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Instructions shown, nothing measured yet.
    Intro,
    /// Strips are being dipped.
    Measuring,
    /// Identify mode: letters are being matched to names.
    Associating,
    /// Terminal: final score known.
    Results,
}

impl Phase {
    /// True for `Results`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Results)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Intro => "intro",
            Self::Measuring => "measuring",
            Self::Associating => "associating",
            Self::Results => "results",
        };
        f.write_str(name)
    }
}

/// A recorded strip reading; at most one per solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    solution_id: String,
    measured_ph: f64,
    accuracy: Option<f64>,
    created_at: DateTime<Utc>,
}

impl Measurement {
    /// Id of the measured solution.
    #[must_use]
    pub fn solution_id(&self) -> &str {
        &self.solution_id
    }

    /// Observed pH.
    #[must_use]
    pub const fn measured_ph(&self) -> f64 {
        self.measured_ph
    }

    /// Accuracy of this reading (continuous mode only).
    #[must_use]
    pub const fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    /// When the strip developed.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Color of the used strip.
    #[must_use]
    pub fn strip_color(&self) -> &'static str {
        indicator::strip_color(self.measured_ph)
    }
}

/// Identify-mode guess for one mystery letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    letter: char,
    guessed_name: Option<String>,
}

impl Association {
    /// No guess yet.
    #[must_use]
    pub const fn empty(letter: char) -> Self {
        Self {
            letter,
            guessed_name: None,
        }
    }

    /// A letter with a guess.
    #[must_use]
    pub fn guessed(letter: char, name: impl Into<String>) -> Self {
        let mut association = Self::empty(letter);
        association.set_guess(&name.into());
        association
    }

    /// Mystery letter.
    #[must_use]
    pub const fn letter(&self) -> char {
        self.letter
    }

    /// Guessed solution name, if chosen.
    #[must_use]
    pub fn guessed_name(&self) -> Option<&str> {
        self.guessed_name.as_deref()
    }

    /// True once a guess is set.
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        self.guessed_name.is_some()
    }

    fn set_guess(&mut self, name: &str) {
        let name = name.trim();
        self.guessed_name = (!name.is_empty()).then(|| name.to_string());
    }
}

/// Root aggregate of one run through the lab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSession {
    id: SessionId,
    phase: Phase,
    measurements: Vec<Measurement>,
    associations: Vec<Association>,
    board: ScoreBoard,
    attempts: u32,
    pending: Option<String>,
    report: Option<ScoreReport>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl ExperimentSession {
    pub(crate) const fn new(id: SessionId) -> Self {
        Self {
            id,
            phase: Phase::Intro,
            measurements: Vec::new(),
            associations: Vec::new(),
            board: ScoreBoard::new(),
            attempts: 0,
            pending: None,
            report: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Session identity.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Live measurements, oldest first; re-measured solutions move to the end.
    #[must_use]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// The newest `n` measurements, newest first.
    pub fn recent_measurements(&self, n: usize) -> impl Iterator<Item = &Measurement> {
        self.measurements.iter().rev().take(n)
    }

    /// Measurement for a solution, if taken.
    #[must_use]
    pub fn measurement_for(&self, solution_id: &str) -> Option<&Measurement> {
        self.measurements
            .iter()
            .find(|m| m.solution_id == solution_id)
    }

    /// Number of distinct solutions measured.
    #[must_use]
    pub fn distinct_measurements(&self) -> usize {
        self.measurements.len()
    }

    /// Completed measurement actions, repeats included.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Continuous-mode accuracy totals.
    #[must_use]
    pub const fn score_board(&self) -> &ScoreBoard {
        &self.board
    }

    /// Rounded running average accuracy, `None` before the first scored attempt.
    #[must_use]
    pub fn running_score(&self) -> Option<u8> {
        self.board.average().map(|_| self.board.score())
    }

    /// Associations in catalog letter order (associating phase onward).
    #[must_use]
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Association for a letter.
    #[must_use]
    pub fn association(&self, letter: char) -> Option<&Association> {
        self.associations.iter().find(|a| a.letter == letter)
    }

    /// Number of letters with a guess.
    #[must_use]
    pub fn filled_associations(&self) -> usize {
        self.associations.iter().filter(|a| a.is_filled()).count()
    }

    /// Solution whose strip is currently developing.
    #[must_use]
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// True while a strip is developing.
    #[must_use]
    pub const fn is_measuring(&self) -> bool {
        self.pending.is_some()
    }

    /// Final result, once in `Results`.
    #[must_use]
    pub const fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    /// When `start()` was issued.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When results were reached.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Time from start to results.
    #[must_use]
    pub fn time_spent(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }

    pub(crate) fn begin(&mut self, now: DateTime<Utc>) {
        self.phase = Phase::Measuring;
        self.started_at = Some(now);
    }

    pub(crate) fn set_pending(&mut self, solution_id: impl Into<String>) {
        self.pending = Some(solution_id.into());
    }

    /// Record (or replace) the reading for `solution`; returns its accuracy
    /// when `scored`.
    pub(crate) fn record_measurement(
        &mut self,
        solution: &Solution,
        measured_ph: f64,
        scored: bool,
        now: DateTime<Utc>,
    ) -> Option<f64> {
        let accuracy = scored.then(|| self.board.record(solution.true_ph(), measured_ph));
        self.attempts += 1;
        self.pending = None;

        self.measurements.retain(|m| m.solution_id != solution.id());
        self.measurements.push(Measurement {
            solution_id: solution.id().to_string(),
            measured_ph,
            accuracy,
            created_at: now,
        });
        accuracy
    }

    pub(crate) fn open_associations<I>(&mut self, letters: I)
    where
        I: IntoIterator<Item = char>,
    {
        self.phase = Phase::Associating;
        self.associations = letters.into_iter().map(Association::empty).collect();
    }

    /// Returns false when the letter has no association slot.
    pub(crate) fn set_association(&mut self, letter: char, guessed_name: &str) -> bool {
        match self.associations.iter_mut().find(|a| a.letter == letter) {
            Some(association) => {
                association.set_guess(guessed_name);
                true
            }
            None => false,
        }
    }

    pub(crate) fn finish(&mut self, report: ScoreReport, now: DateTime<Utc>) {
        self.phase = Phase::Results;
        self.report = Some(report);
        self.completed_at = Some(now);
    }
}
