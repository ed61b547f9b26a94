//! Solution catalog - static registry of the lab's chemical solutions
//!
//! The catalog is immutable once built and is shared read-only across every
//! session (`Arc<SolutionCatalog>`). Lookups are pure.
//!
//! ## Usage
//!
//! ```rust
//! use ph_lab::catalog::SolutionCatalog;
//!
//! let catalog = SolutionCatalog::builtin();
//! let lemon = catalog.by_letter('A')?;
//! assert_eq!(lemon.id(), "lemon");
//! assert!(lemon.true_ph() < 7.0);
//! # Ok::<(), ph_lab::Error>(())
//! ```

pub mod indicator;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Lowest pH a solution may carry
pub const PH_MIN: f64 = 0.0;
/// Highest pH a solution may carry
pub const PH_MAX: f64 = 14.0;

/// Number of solutions in [`SolutionCatalog::builtin`].
pub const BUILTIN_LEN: usize = 7;

/// A chemical solution on the lab bench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    id: String,
    letter: Option<char>,
    name: String,
    true_ph: f64,
    color: String,
    description: String,
}

impl Solution {
    /// Create a solution with no letter, color or description.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, true_ph: f64) -> Self {
        SolutionBuilder::new(id, name, true_ph).build()
    }

    /// Create a builder for a solution with optional display fields.
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        true_ph: f64,
    ) -> SolutionBuilder {
        SolutionBuilder::new(id, name, true_ph)
    }

    /// Unique key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Mystery-beaker letter, if any.
    #[must_use]
    pub const fn letter(&self) -> Option<char> {
        self.letter
    }

    /// Display name, also the answer expected during identification.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference pH.
    #[must_use]
    pub const fn true_ph(&self) -> f64 {
        self.true_ph
    }

    /// Display color (passed through to rendering only).
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    /// Short description ("Very acidic", ...).
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for `Solution`.
#[derive(Debug)]
pub struct SolutionBuilder {
    id: String,
    letter: Option<char>,
    name: String,
    true_ph: f64,
    color: String,
    description: String,
}

impl SolutionBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, true_ph: f64) -> Self {
        Self {
            id: id.into(),
            letter: None,
            name: name.into(),
            true_ph,
            color: String::new(),
            description: String::new(),
        }
    }

    /// Set the mystery-beaker letter.
    #[must_use]
    pub fn letter(mut self, letter: char) -> Self {
        self.letter = Some(letter);
        self
    }

    /// Set the display color.
    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Build the `Solution`.
    #[must_use]
    pub fn build(self) -> Solution {
        Solution {
            id: self.id,
            letter: self.letter,
            name: self.name,
            true_ph: self.true_ph,
            color: self.color,
            description: self.description,
        }
    }
}

/// Immutable, ordered registry of solutions.
///
/// ## Invariants
///
/// - ids are distinct
/// - letters, where present, are distinct
/// - every `true_ph` lies in `[0, 14]`
#[derive(Debug, Clone)]
pub struct SolutionCatalog {
    solutions: Vec<Solution>,
    by_id: HashMap<String, usize>,
    by_letter: HashMap<char, usize>,
}

impl SolutionCatalog {
    /// Build a catalog, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCatalog` if the list is empty, an id or letter
    /// repeats, or a pH is outside `[0, 14]`.
    pub fn new(solutions: Vec<Solution>) -> Result<Self> {
        if solutions.is_empty() {
            return Err(Error::InvalidCatalog("catalog has no solutions".to_string()));
        }

        let mut by_id = HashMap::with_capacity(solutions.len());
        let mut by_letter = HashMap::with_capacity(solutions.len());

        for (index, solution) in solutions.iter().enumerate() {
            if !(PH_MIN..=PH_MAX).contains(&solution.true_ph) {
                return Err(Error::InvalidCatalog(format!(
                    "solution '{}' has pH {} outside [{PH_MIN}, {PH_MAX}]",
                    solution.id, solution.true_ph
                )));
            }
            if by_id.insert(solution.id.clone(), index).is_some() {
                return Err(Error::InvalidCatalog(format!(
                    "duplicate solution id '{}'",
                    solution.id
                )));
            }
            if let Some(letter) = solution.letter {
                if by_letter.insert(letter, index).is_some() {
                    return Err(Error::InvalidCatalog(format!("duplicate letter '{letter}'")));
                }
            }
        }

        Ok(Self {
            solutions,
            by_id,
            by_letter,
        })
    }

    /// The seven mystery beakers of the standard lab, letters A-G.
    #[must_use]
    pub fn builtin() -> Self {
        let solutions = vec![
            Solution::builder("lemon", "Lemon juice", 2.0)
                .letter('A')
                .color("#FFD700")
                .description("Very acidic")
                .build(),
            Solution::builder("bleach", "Bleach", 12.0)
                .letter('B')
                .color("#FFFACD")
                .description("Very basic")
                .build(),
            Solution::builder("water", "Pure water", 7.0)
                .letter('C')
                .color("#87CEEB")
                .description("Neutral")
                .build(),
            Solution::builder("baking-soda", "Baking soda", 9.0)
                .letter('D')
                .color("#E0E0E0")
                .description("Basic")
                .build(),
            Solution::builder("vinegar", "Vinegar", 2.5)
                .letter('E')
                .color("#F4A460")
                .description("Acidic")
                .build(),
            Solution::builder("soapy-water", "Soapy water", 10.0)
                .letter('F')
                .color("#F0F8FF")
                .description("Basic")
                .build(),
            Solution::builder("coffee", "Coffee", 5.0)
                .letter('G')
                .color("#8B4513")
                .description("Slightly acidic")
                .build(),
        ];

        // Fixed data above satisfies every invariant `new` checks.
        let by_id = solutions
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.clone(), i))
            .collect();
        let by_letter = solutions
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.letter.map(|l| (l, i)))
            .collect();
        Self {
            solutions,
            by_id,
            by_letter,
        }
    }

    /// All solutions in stable display order.
    #[must_use]
    pub fn all(&self) -> &[Solution] {
        &self.solutions
    }

    /// Look up by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown id.
    pub fn by_id(&self, id: &str) -> Result<&Solution> {
        self.by_id
            .get(id)
            .map(|&i| &self.solutions[i])
            .ok_or_else(|| Error::solution_not_found(id))
    }

    /// Look up by mystery letter.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown letter.
    pub fn by_letter(&self, letter: char) -> Result<&Solution> {
        self.by_letter
            .get(&letter)
            .map(|&i| &self.solutions[i])
            .ok_or_else(|| Error::letter_not_found(letter))
    }

    /// Letters in display order.
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.solutions.iter().filter_map(|s| s.letter)
    }

    /// True when every solution carries a letter (required for identify mode).
    #[must_use]
    pub fn fully_lettered(&self) -> bool {
        self.by_letter.len() == self.solutions.len()
    }

    /// Number of solutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Always false for a constructed catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}

impl Default for SolutionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_passes_validation() {
        let builtin = SolutionCatalog::builtin();
        let rebuilt = SolutionCatalog::new(builtin.all().to_vec()).unwrap();
        assert_eq!(rebuilt.len(), BUILTIN_LEN);
        assert_eq!(builtin.len(), BUILTIN_LEN);
        assert!(rebuilt.fully_lettered());
    }

    #[test]
    fn test_lookup_by_id_and_letter() {
        let catalog = SolutionCatalog::builtin();
        assert_eq!(catalog.by_id("bleach").unwrap().letter(), Some('B'));
        assert_eq!(catalog.by_letter('G').unwrap().name(), "Coffee");
        assert!(catalog.by_id("mercury").unwrap_err().is_not_found());
        assert!(catalog.by_letter('Z').unwrap_err().is_not_found());
    }

    #[test]
    fn test_order_is_stable() {
        let catalog = SolutionCatalog::builtin();
        let letters: String = catalog.letters().collect();
        assert_eq!(letters, "ABCDEFG");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = SolutionCatalog::new(vec![
            Solution::new("a", "One", 3.0),
            Solution::new("a", "Two", 4.0),
        ]);
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_duplicate_letter_rejected() {
        let result = SolutionCatalog::new(vec![
            Solution::builder("a", "One", 3.0).letter('X').build(),
            Solution::builder("b", "Two", 4.0).letter('X').build(),
        ]);
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_ph_out_of_range_rejected() {
        for ph in [-0.1, 14.5, f64::NAN] {
            let result = SolutionCatalog::new(vec![Solution::new("x", "X", ph)]);
            assert!(matches!(result, Err(Error::InvalidCatalog(_))), "pH {ph}");
        }
    }

    #[test]
    fn test_empty_rejected() {
        assert!(SolutionCatalog::new(Vec::new()).is_err());
    }

    #[test]
    fn test_unlettered_catalog() {
        let catalog = SolutionCatalog::new(vec![
            Solution::builder("a", "One", 3.0).letter('A').build(),
            Solution::new("b", "Two", 4.0),
        ])
        .unwrap();
        assert!(!catalog.fully_lettered());
        assert_eq!(catalog.letters().count(), 1);
    }
}
