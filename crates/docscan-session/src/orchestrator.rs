//! Scan orchestrator.
//!
//! [`ScanOrchestrator`] drives a [`SessionMachine`] against a pair of
//! engines. It reads one item at a time from whichever stream is active,
//! feeds it to the machine and carries out the returned effects in order.
//! Only one engine stream is ever open: the optical stream is stopped
//! before the chip stream starts.
//!
//! # Examples
//!
//! ```
//! use docscan_core::{CompletionEvent, DocReaderAction};
//! use docscan_engine::mock::{MockChipEngine, MockOpticalEngine};
//! use docscan_session::config::SessionConfig;
//! use docscan_session::orchestrator::ScanOrchestrator;
//! use docscan_session::presenter::TracingPresenter;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let (optical, optical_handle) = MockOpticalEngine::new();
//!     let (chip, _chip_handle) = MockChipEngine::new();
//!     optical_handle
//!         .script_session(vec![CompletionEvent::new(DocReaderAction::Complete)])
//!         .await;
//!
//!     let mut orchestrator =
//!         ScanOrchestrator::new(optical, chip, TracingPresenter, &SessionConfig::default());
//!     let outcome = orchestrator.run_scan(false).await;
//!
//!     assert!(outcome.is_success());
//! }
//! ```

use std::collections::VecDeque;

use tracing::{debug, info, trace, warn};

use docscan_core::{CompletionEvent, FailureKind, ScanOutcome};
use docscan_engine::{
    ChipEngine, EngineError, EngineStream, OpticalEngine, PreparationStatus, ReaderConfig,
    StreamKind,
};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::presenter::ResultPresenter;
use crate::state_machine::{Effect, ScanPhase, SessionInput, SessionMachine};

/// The stream the orchestrator is subscribed to.
#[derive(Debug, Default)]
enum ActiveStream {
    #[default]
    None,
    Optical(EngineStream<CompletionEvent>),
    Chip(EngineStream<String>),
}

impl ActiveStream {
    fn kind(&self) -> Option<StreamKind> {
        match self {
            ActiveStream::None => None,
            ActiveStream::Optical(_) => Some(StreamKind::Optical),
            ActiveStream::Chip(_) => Some(StreamKind::Chip),
        }
    }
}

/// Drives scan sessions against an optical and a chip engine.
pub struct ScanOrchestrator<O, C, P> {
    optical: O,
    chip: C,
    presenter: P,
    machine: SessionMachine,
    active: ActiveStream,
    last_outcome: Option<ScanOutcome>,
}

impl<O, C, P> ScanOrchestrator<O, C, P>
where
    O: OpticalEngine,
    C: ChipEngine,
    P: ResultPresenter,
{
    pub fn new(optical: O, chip: C, presenter: P, config: &SessionConfig) -> Self {
        Self {
            optical,
            chip,
            presenter,
            machine: SessionMachine::from_config(config),
            active: ActiveStream::None,
            last_outcome: None,
        }
    }

    /// Prepare the document database and initialize both engines.
    ///
    /// Preparation progress is forwarded to the presenter. The optical
    /// engine is initialized once the database reports `Prepared`, then the
    /// chip engine receives the base chip settings.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation fails or ends early, or if either
    /// engine rejects its configuration.
    pub async fn initialize(&mut self, config: &ReaderConfig) -> Result<()> {
        let mut preparation = self.optical.prepare_database().await?;
        let mut prepared = false;

        while let Some(status) = preparation.recv().await {
            match status? {
                PreparationStatus::Progress(percent) => {
                    debug!("Database preparation at {}%", percent);
                    self.presenter.on_progress(percent.min(100));
                }
                PreparationStatus::Prepared => {
                    prepared = true;
                    break;
                }
            }
        }

        if !prepared {
            return Err(EngineError::initialization_failed(
                "database preparation ended before completion",
            )
            .into());
        }

        self.optical.initialize(config).await?;
        self.chip.apply_settings(&config.rfid).await?;

        let info = self.optical.get_info().await?;
        info!("Engines initialized ({})", info.name);
        Ok(())
    }

    /// Start a new scan, tearing down any scan in progress.
    ///
    /// Returns the outcome if the scan ended immediately, for example
    /// because the optical stream could not be started.
    pub async fn start_scan(&mut self, rfid_requested: bool) -> Option<ScanOutcome> {
        self.last_outcome = None;
        let outcome = self
            .dispatch(SessionInput::Start { rfid_requested })
            .await;
        if outcome.is_none() {
            info!(
                session = %self.machine.id(),
                "Scan started (rfid requested: {})",
                rfid_requested
            );
        }
        outcome
    }

    /// Wait for the next item on the active stream and process it.
    ///
    /// Returns the outcome if this item ended the scan, or `None` if the
    /// scan continues or no stream is active.
    pub async fn step(&mut self) -> Option<ScanOutcome> {
        let rfid_requested = self.machine.state().rfid_requested;

        let input = match &mut self.active {
            ActiveStream::None => return None,
            ActiveStream::Optical(stream) => match stream.recv().await {
                Some(Ok(event)) => {
                    debug!(
                        session = %self.machine.id(),
                        "Optical scan result: action {} (rfid requested: {})",
                        event.action,
                        rfid_requested
                    );
                    SessionInput::OpticalCompletion(event)
                }
                Some(Err(e)) => stream_error(StreamKind::Optical, &e),
                None => stream_ended(StreamKind::Optical),
            },
            ActiveStream::Chip(stream) => match stream.recv().await {
                Some(Ok(raw)) => {
                    trace!(session = %self.machine.id(), "Chip message ({} bytes)", raw.len());
                    SessionInput::ChipMessage(raw)
                }
                Some(Err(e)) => stream_error(StreamKind::Chip, &e),
                None => stream_ended(StreamKind::Chip),
            },
        };

        self.dispatch(input).await
    }

    /// Run a complete scan and return its outcome.
    pub async fn run_scan(&mut self, rfid_requested: bool) -> ScanOutcome {
        if let Some(outcome) = self.start_scan(rfid_requested).await {
            return outcome;
        }

        while self.machine.phase().is_active() {
            if let Some(outcome) = self.step().await {
                return outcome;
            }
        }

        self.last_outcome
            .clone()
            .unwrap_or_else(|| ScanOutcome::failure(FailureKind::Engine))
    }

    /// Stop whichever stream is open and return to idle without an outcome.
    pub async fn abort(&mut self) {
        info!(session = %self.machine.id(), "Scan aborted in phase {}", self.phase());
        self.dispatch(SessionInput::Abort).await;
        self.active = ActiveStream::None;
    }

    pub fn phase(&self) -> ScanPhase {
        self.machine.phase()
    }

    pub fn session(&self) -> &SessionMachine {
        &self.machine
    }

    /// Outcome of the most recent scan, once it has ended.
    pub fn last_outcome(&self) -> Option<&ScanOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Consume the orchestrator and return the engines and presenter.
    pub fn into_parts(self) -> (O, C, P) {
        (self.optical, self.chip, self.presenter)
    }

    /// Apply an input and carry out its effects, feeding engine failures
    /// back into the machine.
    async fn dispatch(&mut self, input: SessionInput) -> Option<ScanOutcome> {
        let mut queue: VecDeque<Effect> = self.machine.apply(input).into();
        let mut outcome = None;

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::StartOptical => match self.optical.start_optical_stream().await {
                    Ok(stream) => self.active = ActiveStream::Optical(stream),
                    Err(e) => self.refeed(&mut queue, stream_error(StreamKind::Optical, &e)),
                },
                Effect::StopOptical => {
                    self.release(StreamKind::Optical);
                    if let Err(e) = self.optical.stop_optical_stream().await {
                        warn!("Failed to stop optical stream: {}", e);
                    }
                }
                Effect::ConfigureChip(credential) => {
                    debug!(
                        session = %self.machine.id(),
                        "Configuring chip access with {} credential",
                        credential.password_type()
                    );
                    if let Err(e) = self.chip.configure_scenario(&credential).await {
                        self.refeed(&mut queue, stream_error(StreamKind::Chip, &e));
                    }
                }
                Effect::StartChip => match self.chip.start_chip_stream().await {
                    Ok(stream) => self.active = ActiveStream::Chip(stream),
                    Err(e) => self.refeed(&mut queue, stream_error(StreamKind::Chip, &e)),
                },
                Effect::StopChip => {
                    self.release(StreamKind::Chip);
                    if let Err(e) = self.chip.stop_chip_stream().await {
                        warn!("Failed to stop chip stream: {}", e);
                    }
                }
                Effect::CredentialAbsent => {
                    warn!(
                        session = %self.machine.id(),
                        "No MRZ or CAN field in the scan result; chip access credential unavailable (policy: {:?})",
                        self.machine.policy()
                    );
                }
                Effect::Emit(result) => {
                    match &result {
                        ScanOutcome::Success(event) => info!(
                            session = %self.machine.id(),
                            "Scan succeeded: action {}, {} text fields",
                            event.action,
                            event.fields.len()
                        ),
                        ScanOutcome::Failure(failure) => {
                            warn!(session = %self.machine.id(), "Scan failed: {}", failure)
                        }
                    }
                    // Dispose the subscription; late engine events are dropped.
                    self.active = ActiveStream::None;
                    self.presenter.on_scan_outcome(&result);
                    self.last_outcome = Some(result.clone());
                    outcome = Some(result);
                }
            }
        }

        outcome
    }

    /// Replace the pending effects with those produced by a failure, keeping
    /// pending stream teardowns.
    fn refeed(&mut self, queue: &mut VecDeque<Effect>, input: SessionInput) {
        queue.retain(Effect::is_teardown);
        queue.extend(self.machine.apply(input));
    }

    fn release(&mut self, kind: StreamKind) {
        if self.active.kind() == Some(kind) {
            self.active = ActiveStream::None;
        }
    }
}

fn stream_error(stream: StreamKind, error: &EngineError) -> SessionInput {
    SessionInput::StreamError {
        stream,
        message: error.to_string(),
    }
}

fn stream_ended(stream: StreamKind) -> SessionInput {
    SessionInput::StreamError {
        stream,
        message: "stream ended without a result".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{ChannelPresenter, PresenterEvent};
    use docscan_core::DocReaderAction;
    use docscan_engine::mock::{
        EngineCall, EngineJournal, MockChipEngine, MockChipHandle, MockOpticalEngine,
        MockOpticalHandle,
    };
    use tokio::sync::mpsc::UnboundedReceiver;

    type Orchestrator = ScanOrchestrator<MockOpticalEngine, MockChipEngine, ChannelPresenter>;

    struct Fixture {
        orchestrator: Orchestrator,
        optical: MockOpticalHandle,
        chip: MockChipHandle,
        journal: EngineJournal,
        events: UnboundedReceiver<PresenterEvent>,
    }

    fn fixture() -> Fixture {
        let journal = EngineJournal::new();
        let (optical_engine, optical) =
            MockOpticalEngine::with_journal("optical".into(), journal.clone());
        let (chip_engine, chip) = MockChipEngine::with_journal("chip".into(), journal.clone());
        let (presenter, events) = ChannelPresenter::new();

        Fixture {
            orchestrator: ScanOrchestrator::new(
                optical_engine,
                chip_engine,
                presenter,
                &SessionConfig::default(),
            ),
            optical,
            chip,
            journal,
            events,
        }
    }

    #[tokio::test]
    async fn test_initialize_forwards_progress_then_configures_engines() {
        let mut f = fixture();
        f.optical
            .set_preparation(vec![
                PreparationStatus::Progress(30),
                PreparationStatus::Progress(100),
                PreparationStatus::Prepared,
            ])
            .await;

        f.orchestrator
            .initialize(&ReaderConfig::default())
            .await
            .unwrap();

        assert_eq!(
            f.events.try_recv().unwrap(),
            PresenterEvent::Progress { percent: 30 }
        );
        assert_eq!(
            f.events.try_recv().unwrap(),
            PresenterEvent::Progress { percent: 100 }
        );
        assert_eq!(
            f.journal.calls(),
            vec![
                EngineCall::PrepareDatabase,
                EngineCall::Initialize,
                EngineCall::ApplySettings
            ]
        );
        assert!(f.chip.applied_settings().await.is_some());
    }

    #[tokio::test]
    async fn test_initialize_fails_when_preparation_never_completes() {
        let mut f = fixture();
        f.optical
            .set_preparation(vec![PreparationStatus::Progress(20)])
            .await;

        let result = f.orchestrator.initialize(&ReaderConfig::default()).await;

        assert!(result.is_err());
        assert!(!f.journal.calls().contains(&EngineCall::Initialize));
    }

    #[tokio::test]
    async fn test_optical_start_failure_fails_scan() {
        let mut f = fixture();
        f.optical.fail_next_start("camera busy").await;

        let outcome = f.orchestrator.run_scan(false).await;

        assert_eq!(outcome, f.orchestrator.last_outcome().cloned().unwrap());
        match outcome {
            ScanOutcome::Failure(failure) => {
                assert_eq!(failure.kind, FailureKind::Engine);
                assert!(failure.detail.unwrap().contains("camera busy"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(f.orchestrator.phase(), ScanPhase::Failed);
    }

    #[tokio::test]
    async fn test_start_scan_returns_outcome_when_optical_start_fails() {
        let mut f = fixture();
        f.optical.fail_next_start("camera busy").await;

        let outcome = f.orchestrator.start_scan(true).await;

        assert!(outcome.is_some_and(|outcome| outcome.is_failure()));
        assert_eq!(f.orchestrator.phase(), ScanPhase::Failed);
        assert!(!f.optical.is_streaming().await);
        assert!(f.orchestrator.step().await.is_none());
    }

    #[tokio::test]
    async fn test_optical_stream_closing_early_fails_scan() {
        let mut f = fixture();
        f.optical
            .script_session(vec![CompletionEvent::new(DocReaderAction::Process)])
            .await;

        assert!(f.orchestrator.start_scan(false).await.is_none());
        assert!(f.orchestrator.step().await.is_none());
        f.optical.close().await;

        let outcome = f.orchestrator.step().await.unwrap();
        assert!(outcome.is_failure());
    }

    #[tokio::test]
    async fn test_chip_configuration_failure_stops_optical_and_fails() {
        let mut f = fixture();
        f.optical
            .script_session(vec![
                CompletionEvent::new(DocReaderAction::Complete).with_field(51, "M1<<"),
            ])
            .await;
        f.chip.reject_next_scenario("bad key").await;

        let outcome = f.orchestrator.run_scan(true).await;

        assert!(outcome.is_failure());
        let calls = f.journal.calls();
        assert!(calls.contains(&EngineCall::StopOptical));
        assert!(!calls.contains(&EngineCall::StartChip));
    }

    #[tokio::test]
    async fn test_abort_stops_active_stream_without_outcome() {
        let mut f = fixture();
        f.orchestrator.start_scan(true).await;

        f.orchestrator.abort().await;

        assert_eq!(f.orchestrator.phase(), ScanPhase::Idle);
        assert!(!f.optical.is_streaming().await);
        assert!(f.orchestrator.step().await.is_none());
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_restart_stops_previous_chip_stream() {
        let mut f = fixture();
        f.optical
            .script_session(vec![
                CompletionEvent::new(DocReaderAction::Complete).with_field(159, "123456"),
            ])
            .await;
        f.orchestrator.start_scan(true).await;
        f.orchestrator.step().await;
        assert_eq!(f.orchestrator.phase(), ScanPhase::RfidActive);

        f.orchestrator.start_scan(false).await;

        assert_eq!(f.orchestrator.phase(), ScanPhase::OpticalActive);
        assert!(!f.chip.is_streaming().await);
        let calls = f.journal.calls();
        assert_eq!(
            &calls[calls.len() - 2..],
            &[EngineCall::StopChip, EngineCall::StartOptical]
        );
    }
}
