//! Scan scenario files and their replay against mock engines.
//!
//! A scenario lists what each engine will deliver:
//!
//! ```json
//! {
//!   "rfidRequested": true,
//!   "optical": [{"action": 1, "results": {"textResult": {"fields": [{"fieldType": 51, "value": "P<UTO"}]}}}],
//!   "chip": ["rfidNotificationCompletionEvent", {"action": 1}]
//! }
//! ```
//!
//! Optical entries use the engine's completion payload format. Chip entries
//! are raw strings, or JSON objects that are sent as their serialized text.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use docscan_core::{CompletionEvent, ScanOutcome};
use docscan_engine::mock::{EngineJournal, MockChipEngine, MockOpticalEngine};
use docscan_engine::{AnyChipEngine, AnyOpticalEngine, ReaderConfig};
use docscan_session::{
    PhaseTransition, ScanOrchestrator, SessionConfig, SessionSummary, TracingPresenter,
};

/// A scripted scan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub rfid_requested: bool,
    #[serde(default)]
    pub optical: Vec<serde_json::Value>,
    #[serde(default)]
    pub chip: Vec<ChipEntry>,
}

/// One message on the chip stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChipEntry {
    Raw(String),
    Payload(serde_json::Value),
}

impl ChipEntry {
    pub fn into_raw(self) -> String {
        match self {
            ChipEntry::Raw(raw) => raw,
            ChipEntry::Payload(value) => value.to_string(),
        }
    }
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid scenario JSON")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Parse the optical entries into completion events.
    pub fn optical_events(&self) -> Result<Vec<CompletionEvent>> {
        self.optical
            .iter()
            .enumerate()
            .map(|(index, value)| {
                CompletionEvent::from_json(&value.to_string())
                    .with_context(|| format!("optical entry {index} is not a completion payload"))
            })
            .collect()
    }

    pub fn chip_messages(&self) -> Vec<String> {
        self.chip.iter().cloned().map(ChipEntry::into_raw).collect()
    }
}

/// Orchestrator driving whichever engines the replay selected.
pub type ReplayOrchestrator =
    ScanOrchestrator<AnyOpticalEngine, AnyChipEngine, TracingPresenter>;

/// What a replay produced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub session: SessionSummary,
    pub outcome: Option<ScanOutcome>,
    pub engine_calls: Vec<String>,
    pub history: Vec<PhaseTransition>,
}

/// Run a scenario through the orchestrator on mock engines.
///
/// The mock streams stay open after their scripted entries, so a scenario
/// without a terminal event ends when no item arrives within `idle_timeout`;
/// the scan is then aborted and the report carries no outcome.
pub async fn replay(
    scenario: &Scenario,
    reader_config: &ReaderConfig,
    session_config: &SessionConfig,
    idle_timeout: Duration,
) -> Result<ReplayReport> {
    let journal = EngineJournal::new();
    let (optical, optical_handle) =
        MockOpticalEngine::with_journal("Mock Optical Engine".to_string(), journal.clone());
    let (chip, chip_handle) =
        MockChipEngine::with_journal("Mock Chip Engine".to_string(), journal.clone());

    optical_handle.script_session(scenario.optical_events()?).await;
    chip_handle.script_session(scenario.chip_messages()).await;

    let mut orchestrator: ReplayOrchestrator = ScanOrchestrator::new(
        AnyOpticalEngine::from(optical),
        AnyChipEngine::from(chip),
        TracingPresenter,
        session_config,
    );
    orchestrator
        .initialize(reader_config)
        .await
        .context("engine initialization failed")?;

    let mut outcome = orchestrator.start_scan(scenario.rfid_requested).await;
    while outcome.is_none() && orchestrator.phase().is_active() {
        match tokio::time::timeout(idle_timeout, orchestrator.step()).await {
            Ok(result) => outcome = result,
            Err(_) => {
                warn!(
                    "No engine event within {}ms; aborting scan",
                    idle_timeout.as_millis()
                );
                orchestrator.abort().await;
            }
        }
    }

    info!("Replay finished in phase {}", orchestrator.phase());

    let session = orchestrator.session();
    Ok(ReplayReport {
        session: session.summary(),
        outcome,
        engine_calls: journal
            .calls()
            .iter()
            .map(|call| format!("{call:?}"))
            .collect(),
        history: session.history().iter().cloned().collect(),
    })
}
