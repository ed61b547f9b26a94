//! Experiment engine, session state and configuration
//!
//! ## State Overview
//!
//! ```text
//! ExperimentEngine (1) ── owns ──> ExperimentSession (1, replaced on reset)
//!                                        │
//!                                        ├──< Measurement (≤ 1 per solution)
//!                                        └──< Association (1 per letter, identify mode)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use ph_lab::catalog::SolutionCatalog;
//! use ph_lab::experiment::{ExperimentConfig, ExperimentEngine, Phase};
//! use ph_lab::notify::TracingSink;
//!
//! let catalog = Arc::new(SolutionCatalog::builtin());
//! let config = ExperimentConfig::identify(catalog.len());
//! let engine = ExperimentEngine::new(catalog, config, Arc::new(TracingSink))?;
//!
//! engine.start()?;
//! assert_eq!(engine.phase(), Phase::Measuring);
//!
//! // Associating before every beaker is measured is rejected
//! assert!(engine.advance().unwrap_err().is_incomplete());
//! # Ok::<(), ph_lab::Error>(())
//! ```

mod config;
mod engine;
mod session;

pub use config::{
    ExperimentConfig, ExperimentConfigBuilder, Mode, DEFAULT_BLOCK_ID, DEFAULT_MEASUREMENT_DELAY,
    DEFAULT_NOISE_AMPLITUDE, DEFAULT_REQUIRED_MEASUREMENTS,
};
pub use engine::{ExperimentEngine, Selection};
pub use session::{Association, ExperimentSession, Measurement, Phase, SessionId};
