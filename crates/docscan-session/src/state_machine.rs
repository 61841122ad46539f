//! Scan session state machine.
//!
//! The core of a scan is the pure [`transition`] function: given the
//! current [`SessionState`] and one [`SessionInput`], it returns the next
//! state and the [`Effect`]s the driver must carry out. It performs no I/O
//! and never blocks, so every path through a scan can be tested without an
//! engine.
//!
//! # Phases
//!
//! - `Idle`: no scan in progress
//! - `OpticalActive`: the optical capture stream is open
//! - `RfidActive`: the chip read stream is open
//! - `Done`: the scan succeeded and the outcome was emitted
//! - `Failed`: the scan failed and the outcome was emitted
//!
//! # Valid Transitions
//!
//! - Idle → OpticalActive
//! - OpticalActive → RfidActive / Done / Failed
//! - RfidActive → Done / Failed
//! - any phase → OpticalActive (new scan) or Idle (abort)
//!
//! # Examples
//!
//! ```
//! use docscan_core::{CompletionEvent, DocReaderAction};
//! use docscan_session::config::CredentialPolicy;
//! use docscan_session::state_machine::{
//!     Effect, ScanPhase, SessionInput, SessionState, transition,
//! };
//!
//! let started = transition(
//!     SessionState::default(),
//!     SessionInput::Start { rfid_requested: false },
//!     CredentialPolicy::Proceed,
//! );
//! assert_eq!(started.state.phase, ScanPhase::OpticalActive);
//! assert_eq!(started.effects, vec![Effect::StartOptical]);
//!
//! let event = CompletionEvent::new(DocReaderAction::Complete);
//! let done = transition(
//!     started.state,
//!     SessionInput::OpticalCompletion(event),
//!     CredentialPolicy::Proceed,
//! );
//! assert_eq!(done.state.phase, ScanPhase::Done);
//! ```

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use docscan_core::{
    AccessCredential, CompletionEvent, DocReaderAction, FailureKind, RfidMessage, ScanFailure,
    ScanOutcome, derive_credential,
};
use docscan_engine::StreamKind;

use crate::config::{CredentialPolicy, DEFAULT_HISTORY_SIZE, SessionConfig};

/// Phase of a scan session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// No scan in progress.
    #[default]
    Idle,

    /// Waiting for optical capture results.
    OpticalActive,

    /// Waiting for the chip read to finish.
    RfidActive,

    /// Success outcome emitted.
    Done,

    /// Failure outcome emitted.
    Failed,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase_str = match self {
            ScanPhase::Idle => "IDLE",
            ScanPhase::OpticalActive => "OPTICAL_ACTIVE",
            ScanPhase::RfidActive => "RFID_ACTIVE",
            ScanPhase::Done => "DONE",
            ScanPhase::Failed => "FAILED",
        };
        write!(f, "{}", phase_str)
    }
}

impl ScanPhase {
    /// Check if transition to target phase is valid from this phase.
    ///
    /// # Examples
    ///
    /// ```
    /// use docscan_session::state_machine::ScanPhase;
    ///
    /// assert!(ScanPhase::OpticalActive.can_transition_to(&ScanPhase::RfidActive));
    /// assert!(!ScanPhase::Idle.can_transition_to(&ScanPhase::Done));
    /// assert!(!ScanPhase::RfidActive.can_transition_to(&ScanPhase::RfidActive));
    /// ```
    pub fn can_transition_to(&self, target: &ScanPhase) -> bool {
        matches!(
            (self, target),
            // Any phase can start a new scan or be aborted
            (_, ScanPhase::OpticalActive | ScanPhase::Idle)
            // From OpticalActive
            | (ScanPhase::OpticalActive, ScanPhase::RfidActive | ScanPhase::Done | ScanPhase::Failed)
            // From RfidActive
            | (ScanPhase::RfidActive, ScanPhase::Done | ScanPhase::Failed)
        )
    }

    /// `Done` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanPhase::Done | ScanPhase::Failed)
    }

    /// An engine stream is open in this phase.
    pub fn is_active(&self) -> bool {
        self.active_stream().is_some()
    }

    /// Stream the session is consuming in this phase, if any.
    pub fn active_stream(&self) -> Option<StreamKind> {
        match self {
            ScanPhase::OpticalActive => Some(StreamKind::Optical),
            ScanPhase::RfidActive => Some(StreamKind::Chip),
            _ => None,
        }
    }
}

/// The session's explicit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: ScanPhase,

    /// Whether the user asked for a chip read. Fixed for the session.
    pub rfid_requested: bool,

    /// Set once the chip stream has delivered its completion payload.
    pub rfid_concluded: bool,
}

impl SessionState {
    fn with_phase(self, phase: ScanPhase) -> Self {
        Self { phase, ..self }
    }
}

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// The user started a scan.
    Start { rfid_requested: bool },

    /// The optical stream delivered a completion event.
    OpticalCompletion(CompletionEvent),

    /// The chip stream delivered a raw message.
    ChipMessage(String),

    /// A stream reported an error or ended without a result.
    StreamError { stream: StreamKind, message: String },

    /// The user cancelled the scan.
    Abort,
}

/// Work the driver must perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartOptical,
    StopOptical,
    ConfigureChip(AccessCredential),
    StartChip,
    StopChip,

    /// No MRZ or CAN field was available for the chip read.
    CredentialAbsent,

    /// Notify the presenter of the terminal outcome.
    Emit(ScanOutcome),
}

impl Effect {
    /// Effects that tear down an engine stream.
    pub fn is_teardown(&self) -> bool {
        matches!(self, Effect::StopOptical | Effect::StopChip)
    }
}

/// Result of applying one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn fail(state: SessionState, mut effects: Vec<Effect>, failure: ScanFailure) -> Self {
        effects.push(Effect::Emit(ScanOutcome::Failure(failure)));
        Self {
            state: state.with_phase(ScanPhase::Failed),
            effects,
        }
    }

    /// The emitted outcome, if this transition ended the scan.
    pub fn outcome(&self) -> Option<&ScanOutcome> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Emit(outcome) => Some(outcome),
            _ => None,
        })
    }
}

/// Compute the next state and effects for one input.
///
/// Inputs that do not belong to the current phase (an optical event while
/// reading the chip, anything after a terminal phase) leave the state
/// unchanged and produce no effects.
pub fn transition(state: SessionState, input: SessionInput, policy: CredentialPolicy) -> Transition {
    match input {
        SessionInput::Start { rfid_requested } => {
            let mut effects = teardown(state.phase);
            effects.push(Effect::StartOptical);
            Transition {
                state: SessionState {
                    phase: ScanPhase::OpticalActive,
                    rfid_requested,
                    rfid_concluded: false,
                },
                effects,
            }
        }

        SessionInput::Abort => Transition {
            state: SessionState::default(),
            effects: teardown(state.phase),
        },

        SessionInput::OpticalCompletion(event) => {
            if state.phase != ScanPhase::OpticalActive {
                return Transition::unchanged(state);
            }
            dispatch(state, event, policy)
        }

        SessionInput::ChipMessage(raw) => {
            if state.phase != ScanPhase::RfidActive {
                return Transition::unchanged(state);
            }
            match RfidMessage::parse(&raw) {
                Ok(RfidMessage::Bookkeeping(_)) => Transition::unchanged(state),
                Ok(RfidMessage::Completion(event)) => {
                    let concluded = SessionState {
                        rfid_requested: true,
                        rfid_concluded: true,
                        ..state
                    };
                    dispatch(concluded, event, policy)
                }
                Err(e) => Transition::fail(
                    SessionState {
                        rfid_concluded: true,
                        ..state
                    },
                    Vec::new(),
                    ScanFailure::new(FailureKind::Parse).with_detail(e.to_string()),
                ),
            }
        }

        SessionInput::StreamError { stream, message } => {
            if state.phase.active_stream() != Some(stream) {
                return Transition::unchanged(state);
            }
            Transition::fail(
                state,
                Vec::new(),
                ScanFailure::new(FailureKind::Engine).with_detail(format!("{stream}: {message}")),
            )
        }
    }
}

/// Handle a completion event from either stream.
///
/// Chip payloads arrive here with `rfid_requested` forced and
/// `rfid_concluded` already set, so they can never pivot again.
fn dispatch(state: SessionState, event: CompletionEvent, policy: CredentialPolicy) -> Transition {
    let pivot_allowed = state.rfid_requested && !state.rfid_concluded;

    match event.action {
        DocReaderAction::Complete if pivot_allowed => pivot(state, &event, policy),
        DocReaderAction::Complete => Transition {
            state: state.with_phase(ScanPhase::Done),
            effects: vec![Effect::Emit(ScanOutcome::Success(event))],
        },
        DocReaderAction::MorePagesAvailable if pivot_allowed => pivot(state, &event, policy),
        DocReaderAction::Error => {
            let failure = match event.error {
                Some(detail) => ScanFailure::new(FailureKind::Engine).with_detail(detail),
                None => ScanFailure::new(FailureKind::Engine),
            };
            Transition::fail(state, Vec::new(), failure)
        }
        DocReaderAction::MorePagesAvailable
        | DocReaderAction::Process
        | DocReaderAction::Cancel
        | DocReaderAction::Notification
        | DocReaderAction::ProcessWhiteUvImage
        | DocReaderAction::Unknown(_) => Transition::unchanged(state),
    }
}

/// Switch from optical capture to the chip read.
fn pivot(state: SessionState, event: &CompletionEvent, policy: CredentialPolicy) -> Transition {
    let mut effects = Vec::with_capacity(3);

    match derive_credential(&event.fields) {
        Some(credential) => effects.push(Effect::ConfigureChip(credential)),
        None => {
            effects.push(Effect::CredentialAbsent);
            if policy == CredentialPolicy::Abort {
                effects.push(Effect::StopOptical);
                return Transition::fail(
                    state,
                    effects,
                    ScanFailure::new(FailureKind::CredentialAbsent),
                );
            }
        }
    }

    effects.push(Effect::StopOptical);
    effects.push(Effect::StartChip);

    Transition {
        state: state.with_phase(ScanPhase::RfidActive),
        effects,
    }
}

fn teardown(phase: ScanPhase) -> Vec<Effect> {
    match phase.active_stream() {
        Some(StreamKind::Optical) => vec![Effect::StopOptical],
        Some(StreamKind::Chip) => vec![Effect::StopChip],
        None => Vec::new(),
    }
}

/// A recorded phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: ScanPhase,
    pub to: ScanPhase,
    pub at: DateTime<Utc>,
}

impl PhaseTransition {
    pub fn new(from: ScanPhase, to: ScanPhase) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
        }
    }
}

/// Identity and flags of the current session, for logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub phase: ScanPhase,
    pub rfid_requested: bool,
    pub rfid_concluded: bool,
}

/// Owner of the session state between inputs.
///
/// Wraps [`transition`] with a session identity, a bounded phase history
/// and logging. Each `Start` input begins a new session with a fresh id.
///
/// # Examples
///
/// ```
/// use docscan_session::state_machine::{Effect, ScanPhase, SessionInput, SessionMachine};
///
/// let mut machine = SessionMachine::new();
/// let effects = machine.apply(SessionInput::Start { rfid_requested: true });
///
/// assert_eq!(effects, vec![Effect::StartOptical]);
/// assert_eq!(machine.phase(), ScanPhase::OpticalActive);
/// assert_eq!(machine.history().len(), 1);
/// ```
#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    policy: CredentialPolicy,
    id: Uuid,
    started_at: DateTime<Utc>,
    history: VecDeque<PhaseTransition>,
    history_size: usize,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    /// Create an idle machine with the default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create an idle machine from a session configuration.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::builder()
            .with_policy(config.credential_policy)
            .with_history_size(config.history_size)
            .build()
    }

    pub fn builder() -> SessionMachineBuilder {
        SessionMachineBuilder::default()
    }

    /// Apply one input and return the effects to perform.
    pub fn apply(&mut self, input: SessionInput) -> Vec<Effect> {
        let starting = matches!(input, SessionInput::Start { .. });
        if starting {
            self.id = Uuid::new_v4();
            self.started_at = Utc::now();
        }

        let from = self.state;
        let Transition { state, effects } = transition(from, input, self.policy);
        self.state = state;

        if starting || from.phase != state.phase {
            debug!(session = %self.id, "phase {} -> {}", from.phase, state.phase);
            self.record(PhaseTransition::new(from.phase, state.phase));
        } else if effects.is_empty() && from == state {
            trace!(session = %self.id, "input discarded in phase {}", state.phase);
        }

        effects
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> ScanPhase {
        self.state.phase
    }

    pub fn policy(&self) -> CredentialPolicy {
        self.policy
    }

    /// Id of the current (or last) session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            started_at: self.started_at,
            phase: self.state.phase,
            rfid_requested: self.state.rfid_requested,
            rfid_concluded: self.state.rfid_concluded,
        }
    }

    /// Phase changes, oldest first.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// The last `count` phase changes, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<PhaseTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    fn record(&mut self, transition: PhaseTransition) {
        if self.history.len() >= self.history_size {
            self.history.pop_front();
        }
        self.history.push_back(transition);
    }
}

/// Builder for [`SessionMachine`].
#[derive(Debug, Clone, Default)]
pub struct SessionMachineBuilder {
    policy: CredentialPolicy,
    history_size: Option<usize>,
}

impl SessionMachineBuilder {
    pub fn with_policy(mut self, policy: CredentialPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cap the phase history. Zero is treated as one.
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = Some(size.max(1));
        self
    }

    pub fn build(self) -> SessionMachine {
        let history_size = self.history_size.unwrap_or(DEFAULT_HISTORY_SIZE);
        SessionMachine {
            state: SessionState::default(),
            policy: self.policy,
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            history: VecDeque::with_capacity(history_size.min(DEFAULT_HISTORY_SIZE)),
            history_size,
        }
    }
}
