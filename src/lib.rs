//! # ph-lab: Virtual pH Laboratory Engine
//!
//! **Version**: 0.1.0
//!
//! ph-lab is the state and scoring engine behind a virtual pH lab. A learner
//! dips simulated test strips into mystery solutions and is scored either on
//! measurement accuracy or on identifying each mystery beaker from its
//! readings. The hosting page receives exactly one completion event per
//! session.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Stale strip readings can never touch a reset session
//! - **Jidoka**: One completion event per session, tied to the transition
//! - **Heijunka**: One strip in flight at a time
//! - **Genchi Genbutsu**: Seeded noise so every run can be replayed
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ph_lab::catalog::SolutionCatalog;
//! use ph_lab::experiment::{ExperimentConfig, ExperimentEngine};
//! use ph_lab::notify::ChannelSink;
//!
//! # #[tokio::main]
//! # async fn main() -> ph_lab::Result<()> {
//! let (sink, mut events) = ChannelSink::new();
//! let engine = ExperimentEngine::new(
//!     Arc::new(SolutionCatalog::builtin()),
//!     ExperimentConfig::continuous(),
//!     Arc::new(sink),
//! )?;
//!
//! engine.start()?;
//! for id in ["lemon", "bleach", "water", "coffee", "vinegar"] {
//!     engine.select_solution(id)?;
//!     engine.settled().await;
//! }
//!
//! let event = events.recv().await.expect("completion event");
//! println!("score: {}/{}", event.score, event.max_score);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod catalog;
pub mod error;
pub mod experiment;
pub mod notify;
pub mod scoring;
pub mod simulator;

pub use error::{Error, Result};
