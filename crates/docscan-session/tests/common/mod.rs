//! Common test utilities for scan flow integration tests.
//!
//! Builders for engine payloads plus a [`Harness`] that wires mock engines,
//! a shared call journal and a channel presenter into one orchestrator.

#![allow(dead_code)]

use docscan_core::constants::{FIELD_TYPE_CARD_ACCESS_NUMBER, FIELD_TYPE_MRZ_STRINGS};
use docscan_core::{CompletionEvent, DocReaderAction, ScanOutcome};
use docscan_engine::mock::{
    EngineCall, EngineJournal, MockChipEngine, MockChipHandle, MockOpticalEngine,
    MockOpticalHandle,
};
use docscan_session::{ChannelPresenter, PresenterEvent, ScanOrchestrator, SessionConfig};
use tokio::sync::mpsc::UnboundedReceiver;

pub type MockOrchestrator = ScanOrchestrator<MockOpticalEngine, MockChipEngine, ChannelPresenter>;

/// Orchestrator over mock engines with access to every control surface.
pub struct Harness {
    pub orchestrator: MockOrchestrator,
    pub optical: MockOpticalHandle,
    pub chip: MockChipHandle,
    pub journal: EngineJournal,
    pub events: UnboundedReceiver<PresenterEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let journal = EngineJournal::new();
        let (optical_engine, optical) =
            MockOpticalEngine::with_journal("optical".to_string(), journal.clone());
        let (chip_engine, chip) =
            MockChipEngine::with_journal("chip".to_string(), journal.clone());
        let (presenter, events) = ChannelPresenter::new();

        Self {
            orchestrator: ScanOrchestrator::new(optical_engine, chip_engine, presenter, &config),
            optical,
            chip,
            journal,
            events,
        }
    }

    /// Drain every outcome the presenter has received so far.
    pub fn outcomes(&mut self) -> Vec<ScanOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let PresenterEvent::Outcome { outcome } = event {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.journal.count(call)
    }
}

/// Optical result carrying an MRZ line.
pub fn optical_with_mrz(action: DocReaderAction, mrz: &str) -> CompletionEvent {
    CompletionEvent::new(action).with_field(FIELD_TYPE_MRZ_STRINGS, mrz)
}

/// Optical result carrying a card access number.
pub fn optical_with_can(action: DocReaderAction, can: &str) -> CompletionEvent {
    CompletionEvent::new(action).with_field(FIELD_TYPE_CARD_ACCESS_NUMBER, can)
}

/// Chip completion payload in the engine's JSON wire format.
pub fn chip_payload(action: i32) -> String {
    format!(
        r#"{{"action":{action},"results":{{"textResult":{{"fields":[{{"fieldType":1,"value":"ERIKSSON"}}]}}}}}}"#
    )
}

/// The four bookkeeping messages a chip read emits before its result.
pub fn bookkeeping_messages() -> Vec<String> {
    vec![
        "rfidNotificationCompletionEvent:{\"notification\":65536}".to_string(),
        "paCertificateCompletionEvent".to_string(),
        "taCertificateCompletionEvent".to_string(),
        "taSignatureCompletionEvent".to_string(),
    ]
}

/// Assert the presenter saw exactly one outcome and return it.
pub fn assert_single_outcome(harness: &mut Harness) -> ScanOutcome {
    let outcomes = harness.outcomes();
    assert_eq!(
        outcomes.len(),
        1,
        "expected exactly one outcome, got {outcomes:?}"
    );
    outcomes.into_iter().next().unwrap()
}
