//! Experiment engine - the phase state machine
//!
//! ```text
//! Intro ──start──> Measuring ──(continuous: N distinct)──────────────> Results
//!                      │                                                 ▲
//!                      └──(identify: all measured / advance)──> Associating ──validate──┘
//!
//! reset: any phase ──> Intro (fresh session, in-flight strip aborted)
//! ```
//!
//! The engine is the only thing the UI talks to. Commands are synchronous and
//! applied in call order; `select_solution` spawns the strip-development task
//! on the current tokio runtime, and its completion is applied under the same
//! lock as every other command. A completion tagged with a superseded
//! `SessionId` is dropped, so a reset can never be overwritten by a strip
//! from the previous session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::config::{ExperimentConfig, Mode};
use super::session::{Association, ExperimentSession, Measurement, Phase, SessionId};
use crate::catalog::SolutionCatalog;
use crate::notify::{CompletionNotifier, CompletionSink, PendingCompletion};
use crate::scoring::{score_associations, ScoreReport};
use crate::simulator::{MeasurementSimulator, NoiseSource, RngNoise};
use crate::{Error, Result};

/// Outcome of `select_solution`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// A strip is now developing for the solution.
    Started,
    /// That solution's strip was already developing; nothing changed.
    AlreadyPending,
}

/// Drives one learner through the lab.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use ph_lab::catalog::SolutionCatalog;
/// use ph_lab::experiment::{ExperimentConfig, ExperimentEngine, Mode, Phase};
/// use ph_lab::notify::MemorySink;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ph_lab::Result<()> {
/// let config = ExperimentConfig::builder(Mode::Continuous)
///     .required_distinct_measurements(1)
///     .measurement_delay(Duration::from_millis(5))
///     .seed(1)
///     .build();
/// let sink = Arc::new(MemorySink::new());
/// let engine = ExperimentEngine::new(Arc::new(SolutionCatalog::builtin()), config, sink.clone())?;
///
/// engine.start()?;
/// engine.select_solution("vinegar")?;
/// let session = engine.settled().await;
///
/// assert_eq!(session.phase(), Phase::Results);
/// assert_eq!(sink.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct ExperimentEngine {
    shared: Arc<Shared>,
}

struct Shared {
    catalog: Arc<SolutionCatalog>,
    config: ExperimentConfig,
    state: Mutex<EngineState>,
    snapshots: watch::Sender<ExperimentSession>,
}

struct EngineState {
    session: ExperimentSession,
    simulator: MeasurementSimulator,
    notifier: CompletionNotifier,
    in_flight: Option<JoinHandle<()>>,
    next_session: u64,
}

fn invalid(command: &'static str, session: &ExperimentSession) -> Error {
    Error::InvalidState {
        command,
        phase: session.phase().to_string(),
    }
}

impl ExperimentEngine {
    /// Create an engine; noise comes from `config.seed()` or host entropy.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the config does not fit the catalog.
    pub fn new(
        catalog: Arc<SolutionCatalog>,
        config: ExperimentConfig,
        sink: Arc<dyn CompletionSink>,
    ) -> Result<Self> {
        match config.seed() {
            Some(seed) => Self::with_noise(catalog, config, sink, RngNoise::seeded(seed)),
            None => Self::with_noise(catalog, config, sink, RngNoise::from_entropy()),
        }
    }

    /// Create an engine with an explicit noise source.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the config does not fit the catalog.
    pub fn with_noise(
        catalog: Arc<SolutionCatalog>,
        config: ExperimentConfig,
        sink: Arc<dyn CompletionSink>,
        noise: impl NoiseSource + 'static,
    ) -> Result<Self> {
        config.validate(&catalog)?;

        let simulator = MeasurementSimulator::new(
            noise,
            config.noise_amplitude(),
            config.measurement_delay(),
        );
        let notifier = CompletionNotifier::new(config.block_id(), sink);
        let session = ExperimentSession::new(SessionId::new(1));
        let (snapshots, _) = watch::channel(session.clone());

        info!(
            mode = ?config.mode(),
            required = config.required_distinct_measurements(),
            solutions = catalog.len(),
            "experiment engine created"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                catalog,
                config,
                state: Mutex::new(EngineState {
                    session,
                    simulator,
                    notifier,
                    in_flight: None,
                    next_session: 2,
                }),
                snapshots,
            }),
        })
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// `Intro -> Measuring`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` outside `Intro`.
    #[instrument(skip(self))]
    pub fn start(&self) -> Result<()> {
        let mut state = self.shared.lock();
        if state.session.phase() != Phase::Intro {
            return Err(invalid("start", &state.session));
        }

        state.session.begin(Utc::now());
        info!(session = %state.session.id(), "experiment started");
        self.shared.publish(&state.session);
        Ok(())
    }

    /// Dip a strip into solution `id`.
    ///
    /// The reading lands after the configured delay. Re-selecting the solution
    /// whose strip is developing is a no-op.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` for an unknown id (state unchanged)
    /// - `Error::InvalidState` outside `Measuring`, or while another
    ///   solution's strip is developing
    /// - `Error::NoRuntime` when called outside a tokio runtime
    #[instrument(skip(self))]
    pub fn select_solution(&self, id: &str) -> Result<Selection> {
        let solution = self.shared.catalog.by_id(id)?;
        let mut guard = self.shared.lock();
        let state = &mut *guard;

        if state.session.phase() != Phase::Measuring {
            return Err(invalid("select a solution", &state.session));
        }
        if let Some(pending) = state.session.pending() {
            if pending == id {
                debug!(solution = id, "strip already developing");
                return Ok(Selection::AlreadyPending);
            }
            return Err(Error::InvalidState {
                command: "select a solution",
                phase: format!("measuring '{pending}'"),
            });
        }

        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let reading = state.simulator.measure(solution);
        let session_id = state.session.id();
        let solution_id = solution.id().to_string();
        let shared = Arc::downgrade(&self.shared);

        let task_solution = solution_id.clone();
        state.in_flight = Some(runtime.spawn(async move {
            let measured = reading.await;
            if let Some(shared) = Weak::upgrade(&shared) {
                shared.complete_measurement(session_id, &task_solution, measured);
            }
        }));
        state.session.set_pending(solution_id);

        debug!(session = %session_id, solution = id, "strip dipped");
        self.shared.publish(&state.session);
        Ok(Selection::Started)
    }

    /// Identify mode: `Measuring -> Associating` once every solution is measured.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` outside identify-mode `Measuring`, or while a
    ///   strip is developing
    /// - `Error::IncompleteState` if some solution is still unmeasured
    #[instrument(skip(self))]
    pub fn advance(&self) -> Result<()> {
        let mut guard = self.shared.lock();
        let state = &mut *guard;

        if self.shared.config.mode() != Mode::Identify || state.session.phase() != Phase::Measuring
        {
            return Err(invalid("advance", &state.session));
        }
        let have = state.session.distinct_measurements();
        let need = self.shared.catalog.len();
        if have < need {
            return Err(Error::IncompleteState {
                what: "measurements",
                have,
                need,
            });
        }
        if state.session.is_measuring() {
            return Err(Error::InvalidState {
                command: "advance",
                phase: "a strip is developing".to_string(),
            });
        }

        self.shared.open_associations(state);
        self.shared.publish(&state.session);
        Ok(())
    }

    /// Guess the name behind mystery `letter`; overwrites any prior guess.
    /// An empty name clears the guess.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` for a letter not in the catalog
    /// - `Error::InvalidState` outside `Associating`
    #[instrument(skip(self))]
    pub fn set_association(&self, letter: char, guessed_name: &str) -> Result<()> {
        self.shared.catalog.by_letter(letter)?;
        let mut state = self.shared.lock();

        if state.session.phase() != Phase::Associating {
            return Err(invalid("set an association", &state.session));
        }
        if !state.session.set_association(letter, guessed_name) {
            return Err(Error::letter_not_found(letter));
        }

        debug!(letter = %letter, guess = guessed_name, "association set");
        self.shared.publish(&state.session);
        Ok(())
    }

    /// `Associating -> Results`, scoring every association.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidState` outside `Associating`
    /// - `Error::IncompleteState` while any letter lacks a guess
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<ScoreReport> {
        let mut guard = self.shared.lock();
        let state = &mut *guard;

        if state.session.phase() != Phase::Associating {
            return Err(invalid("validate", &state.session));
        }
        let have = state.session.filled_associations();
        let need = state.session.associations().len();
        if have < need {
            return Err(Error::IncompleteState {
                what: "associations",
                have,
                need,
            });
        }

        let result = score_associations(state.session.associations(), &self.shared.catalog);
        let report = ScoreReport::identify(result, state.session.distinct_measurements());
        let completion = self.shared.finish(state, report);
        self.shared.publish(&state.session);
        drop(guard);

        if let Some(completion) = completion {
            completion.deliver();
        }
        Ok(report)
    }

    /// Discard the session and start a fresh one in `Intro`.
    ///
    /// Legal from every phase. A strip still developing is aborted and its
    /// reading can never reach the new session.
    #[instrument(skip(self))]
    pub fn reset(&self) -> SessionId {
        let mut guard = self.shared.lock();
        let state = &mut *guard;

        if let Some(task) = state.in_flight.take() {
            task.abort();
            debug!(session = %state.session.id(), "aborted developing strip");
        }

        let previous = state.session.id();
        let id = SessionId::new(state.next_session);
        state.next_session += 1;
        state.session = ExperimentSession::new(id);

        info!(%previous, session = %id, "experiment reset");
        self.shared.publish(&state.session);
        id
    }

    // ------------------------------------------------------------------
    // Read-only surface
    // ------------------------------------------------------------------

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.shared.lock().session.phase()
    }

    /// Current session id.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.shared.lock().session.id()
    }

    /// Copy of the whole session.
    #[must_use]
    pub fn snapshot(&self) -> ExperimentSession {
        self.shared.lock().session.clone()
    }

    /// Live measurements.
    #[must_use]
    pub fn measurements(&self) -> Vec<Measurement> {
        self.shared.lock().session.measurements().to_vec()
    }

    /// Current associations.
    #[must_use]
    pub fn associations(&self) -> Vec<Association> {
        self.shared.lock().session.associations().to_vec()
    }

    /// Running average accuracy (continuous mode).
    #[must_use]
    pub fn running_score(&self) -> Option<u8> {
        self.shared.lock().session.running_score()
    }

    /// Final report, once in `Results`.
    #[must_use]
    pub fn final_report(&self) -> Option<ScoreReport> {
        self.shared.lock().session.report().copied()
    }

    /// True while a strip is developing.
    #[must_use]
    pub fn is_measuring(&self) -> bool {
        self.shared.lock().session.is_measuring()
    }

    /// Solution whose strip is developing.
    #[must_use]
    pub fn pending_solution(&self) -> Option<String> {
        self.shared.lock().session.pending().map(str::to_string)
    }

    /// Catalog this engine runs on.
    #[must_use]
    pub fn catalog(&self) -> &SolutionCatalog {
        &self.shared.catalog
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &ExperimentConfig {
        &self.shared.config
    }

    /// Receiver that sees a fresh snapshot after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ExperimentSession> {
        self.shared.snapshots.subscribe()
    }

    /// Wait until no strip is developing, then return the session.
    pub async fn settled(&self) -> ExperimentSession {
        let mut receiver = self.subscribe();
        let session = match receiver.wait_for(|session| !session.is_measuring()).await {
            Ok(session) => session.clone(),
            Err(_) => self.snapshot(),
        };
        session
    }
}

impl Drop for ExperimentEngine {
    fn drop(&mut self) {
        if let Some(task) = self.shared.lock().in_flight.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for ExperimentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentEngine")
            .field("config", &self.shared.config)
            .field("session", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &ExperimentSession) {
        self.snapshots.send_replace(session.clone());
    }

    /// Apply a developed strip. Runs on the measurement task.
    fn complete_measurement(&self, session_id: SessionId, solution_id: &str, measured_ph: f64) {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.session.id() != session_id || state.session.pending() != Some(solution_id) {
            warn!(
                session = %session_id,
                solution = solution_id,
                "discarding reading from a superseded session"
            );
            return;
        }
        let Ok(solution) = self.catalog.by_id(solution_id) else {
            return;
        };

        state.in_flight = None;
        let scored = self.config.mode() == Mode::Continuous;
        let accuracy = state
            .session
            .record_measurement(solution, measured_ph, scored, Utc::now());
        debug!(
            session = %session_id,
            solution = solution_id,
            measured_ph,
            accuracy,
            distinct = state.session.distinct_measurements(),
            "reading recorded"
        );

        let distinct = state.session.distinct_measurements();
        let mut completion = None;
        match self.config.mode() {
            Mode::Continuous if distinct >= self.config.required_distinct_measurements() => {
                let report = ScoreReport::continuous(state.session.score_board(), distinct);
                completion = self.finish(state, report);
            }
            Mode::Identify if self.config.auto_advance() && distinct >= self.catalog.len() => {
                self.open_associations(state);
            }
            _ => {}
        }

        self.publish(&state.session);
        drop(guard);

        // Sinks may call back into the engine, so deliver unlocked.
        if let Some(completion) = completion {
            completion.deliver();
        }
    }

    fn open_associations(&self, state: &mut EngineState) {
        state.session.open_associations(self.catalog.letters());
        info!(
            session = %state.session.id(),
            letters = state.session.associations().len(),
            "all solutions measured, associating"
        );
    }

    /// Enter `Results`; the returned event must be delivered once the lock is released.
    fn finish(&self, state: &mut EngineState, report: ScoreReport) -> Option<PendingCompletion> {
        state.session.finish(report, Utc::now());
        info!(
            session = %state.session.id(),
            score = report.score(),
            "results reached"
        );
        state.notifier.claim(&state.session)
    }
}
