//! Error types for ph-lab
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! None of these are fatal. `NotFound` and `IncompleteState` exist so the UI
//! layer can drive enabled/disabled controls; `InvalidState` marks a command
//! issued in the wrong phase.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ph-lab error types
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown solution id or letter
    #[error("{kind} not found: {key}")]
    NotFound {
        /// What was looked up ("solution" or "letter")
        kind: &'static str,
        /// The key that missed
        key: String,
    },

    /// Command is not legal in the current phase
    #[error("Invalid state: cannot {command} while {phase}")]
    InvalidState {
        /// Command that was rejected
        command: &'static str,
        /// Description of the state that rejected it
        phase: String,
    },

    /// `advance`/`validate` issued before everything required exists
    #[error("Incomplete {what}: have {have}, need {need}")]
    IncompleteState {
        /// What is incomplete ("measurements" or "associations")
        what: &'static str,
        /// How many are present
        have: usize,
        /// How many are required
        need: usize,
    },

    /// Catalog violates its invariants
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Configuration does not fit the catalog
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Measurement requested outside a tokio runtime
    #[error("No tokio runtime available\nMeasurements must be started from within a runtime context")]
    NoRuntime,

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn solution_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "solution",
            key: id.into(),
        }
    }

    pub(crate) fn letter_not_found(letter: char) -> Self {
        Self::NotFound {
            kind: "letter",
            key: letter.to_string(),
        }
    }

    /// True for `NotFound`
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for `InvalidState`
    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// True for `IncompleteState`
    #[must_use]
    pub const fn is_incomplete(&self) -> bool {
        matches!(self, Self::IncompleteState { .. })
    }
}
