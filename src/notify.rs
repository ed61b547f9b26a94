//! Completion notification - one terminal event per session
//!
//! The hosting page learns the final score through a single
//! `BLOCK_COMPLETION` event. Transport is the sink's concern; the notifier
//! only guarantees that a session produces the event at most once, on its
//! transition into `Results`.
//!
//! ```text
//! {
//!   "type": "BLOCK_COMPLETION",
//!   "blockId": "68551dec83bf93908974ebe6",
//!   "completed": true,
//!   "score": 98,
//!   "maxScore": 100,
//!   "data": { "measurements": 5, "averageAccuracy": 98, "timeSpentMs": 9000 }
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::experiment::{ExperimentSession, SessionId};
use crate::scoring::ScoreReport;

/// Discriminator of the event envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// The only kind this crate emits.
    #[serde(rename = "BLOCK_COMPLETION")]
    BlockCompletion,
}

/// Mode-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletionData {
    /// Accuracy lab
    #[serde(rename_all = "camelCase")]
    Continuous {
        /// Distinct solutions measured
        measurements: usize,
        /// Final average accuracy
        average_accuracy: u8,
        /// Milliseconds from start to results
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_spent_ms: Option<u64>,
    },
    /// Identification lab
    #[serde(rename_all = "camelCase")]
    Identify {
        /// Distinct solutions measured
        measurements: usize,
        /// Letters matched to the right name
        correct_associations: usize,
        /// Letters in the catalog
        total_solutions: usize,
        /// Milliseconds from start to results
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_spent_ms: Option<u64>,
    },
}

/// The terminal event delivered to the hosting page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    /// Always `BLOCK_COMPLETION`
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Stable id of the experiment instance
    pub block_id: String,
    /// Always true
    pub completed: bool,
    /// Final score, 0-100
    pub score: u8,
    /// Always 100
    pub max_score: u8,
    /// Mode-specific details
    pub data: CompletionData,
}

impl CompletionEvent {
    /// Build the event for a session that has reached `Results`.
    ///
    /// Returns `None` while the session has no final report.
    #[must_use]
    pub fn for_session(block_id: &str, session: &ExperimentSession) -> Option<Self> {
        let report = session.report()?;
        let time_spent_ms = session
            .time_spent()
            .and_then(|d| u64::try_from(d.num_milliseconds()).ok());

        let data = match *report {
            ScoreReport::Continuous {
                score,
                measurements,
                ..
            } => CompletionData::Continuous {
                measurements,
                average_accuracy: score,
                time_spent_ms,
            },
            ScoreReport::Identify {
                measurements,
                correct,
                total,
                ..
            } => CompletionData::Identify {
                measurements,
                correct_associations: correct,
                total_solutions: total,
                time_spent_ms,
            },
        };

        Some(Self {
            kind: EventKind::BlockCompletion,
            block_id: block_id.to_string(),
            completed: true,
            score: report.score(),
            max_score: report.max_score(),
            data,
        })
    }

    /// Serialize to the JSON the hosting page expects.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if encoding fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Where completion events go (host messaging, a channel, a log).
pub trait CompletionSink: Send + Sync {
    /// Deliver one event.
    fn deliver(&self, event: &CompletionEvent);
}

impl<F> CompletionSink for F
where
    F: Fn(&CompletionEvent) + Send + Sync,
{
    fn deliver(&self, event: &CompletionEvent) {
        self(event);
    }
}

/// Forwards events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<CompletionEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the host reads from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CompletionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl CompletionSink for ChannelSink {
    fn deliver(&self, event: &CompletionEvent) {
        if self.sender.send(event.clone()).is_err() {
            warn!(block_id = %event.block_id, "completion receiver dropped, event lost");
        }
    }
}

/// Keeps every delivered event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CompletionEvent>>,
}

impl MemorySink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything delivered so far.
    #[must_use]
    pub fn events(&self) -> Vec<CompletionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of delivered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True before the first delivery.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CompletionSink for MemorySink {
    fn deliver(&self, event: &CompletionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Logs each event as JSON through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl CompletionSink for TracingSink {
    fn deliver(&self, event: &CompletionEvent) {
        match event.to_json() {
            Ok(json) => info!(target: "ph_lab::completion", payload = %json, "block completed"),
            Err(e) => warn!(error = %e, "failed to encode completion event"),
        }
    }
}

/// Emits the completion event exactly once per session.
pub struct CompletionNotifier {
    block_id: String,
    sink: Arc<dyn CompletionSink>,
    last_emitted: Option<SessionId>,
}

impl CompletionNotifier {
    /// Create a notifier reporting under `block_id`.
    #[must_use]
    pub fn new(block_id: impl Into<String>, sink: Arc<dyn CompletionSink>) -> Self {
        Self {
            block_id: block_id.into(),
            sink,
            last_emitted: None,
        }
    }

    /// Block id carried by every event.
    #[must_use]
    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    /// Whether `session` has already produced its event.
    #[must_use]
    pub fn has_emitted(&self, session: SessionId) -> bool {
        self.last_emitted == Some(session)
    }

    /// Claim the completion event for a session that reached `Results`.
    ///
    /// The first call for a session marks it emitted and returns the event
    /// ready to deliver; later calls for the same session, and calls before
    /// results exist, return `None`. Delivery is left to the caller so it can
    /// happen after any engine lock is released.
    pub fn claim(&mut self, session: &ExperimentSession) -> Option<PendingCompletion> {
        if self.has_emitted(session.id()) {
            return None;
        }
        let event = CompletionEvent::for_session(&self.block_id, session)?;
        self.last_emitted = Some(session.id());
        Some(PendingCompletion {
            sink: Arc::clone(&self.sink),
            event,
        })
    }

    /// Claim and deliver in one step; true when an event went out.
    pub fn on_results_reached(&mut self, session: &ExperimentSession) -> bool {
        self.claim(session).map(PendingCompletion::deliver).is_some()
    }
}

/// A claimed event that has not reached its sink yet.
pub struct PendingCompletion {
    sink: Arc<dyn CompletionSink>,
    event: CompletionEvent,
}

impl PendingCompletion {
    /// The event about to be delivered.
    #[must_use]
    pub const fn event(&self) -> &CompletionEvent {
        &self.event
    }

    /// Hand the event to the sink.
    pub fn deliver(self) {
        info!(block_id = %self.event.block_id, score = self.event.score, "emitting completion event");
        self.sink.deliver(&self.event);
    }
}

impl std::fmt::Debug for PendingCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCompletion")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for CompletionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionNotifier")
            .field("block_id", &self.block_id)
            .field("last_emitted", &self.last_emitted)
            .finish_non_exhaustive()
    }
}
