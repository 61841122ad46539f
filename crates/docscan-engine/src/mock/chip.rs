//! Mock contactless chip engine for testing and development.
//!
//! Mirrors the optical mock: scripted raw messages are delivered when a read
//! starts, and the handle can push more until the read is stopped.

use crate::{
    EngineError, Result,
    config::RfidSettings,
    mock::{EngineCall, EngineJournal},
    stream::{DEFAULT_STREAM_CAPACITY, EngineStream, EngineStreamSender},
    traits::ChipEngine,
    types::EngineInfo,
};
use docscan_core::AccessCredential;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock chip engine.
#[derive(Debug)]
pub struct MockChipEngine {
    /// Engine name
    name: String,

    /// State shared with the handle
    shared: Arc<Mutex<ChipState>>,

    /// Call record
    journal: EngineJournal,
}

#[derive(Debug, Default)]
struct ChipState {
    scripts: VecDeque<Vec<Result<String>>>,
    live: Option<EngineStreamSender<String>>,
    settings: Option<RfidSettings>,
    credentials: Vec<AccessCredential>,
    start_failure: Option<String>,
    scenario_failure: Option<String>,
}

impl MockChipEngine {
    /// Create a new mock chip engine with the default name.
    pub fn new() -> (Self, MockChipHandle) {
        Self::with_name("Mock Chip Engine".to_string())
    }

    /// Create a new mock chip engine with a custom name.
    pub fn with_name(name: String) -> (Self, MockChipHandle) {
        Self::with_journal(name, EngineJournal::new())
    }

    /// Create a mock chip engine that records into a shared journal.
    pub fn with_journal(name: String, journal: EngineJournal) -> (Self, MockChipHandle) {
        let shared = Arc::new(Mutex::new(ChipState::default()));

        let engine = Self {
            name,
            shared: Arc::clone(&shared),
            journal,
        };

        (engine, MockChipHandle { shared })
    }

    /// Journal this engine records into.
    pub fn journal(&self) -> EngineJournal {
        self.journal.clone()
    }
}

impl Default for MockChipEngine {
    fn default() -> Self {
        Self::new().0
    }
}

impl ChipEngine for MockChipEngine {
    async fn apply_settings(&mut self, settings: &RfidSettings) -> Result<()> {
        self.journal.record(EngineCall::ApplySettings);
        self.shared.lock().await.settings = Some(settings.clone());
        Ok(())
    }

    async fn configure_scenario(&mut self, credential: &AccessCredential) -> Result<()> {
        self.journal
            .record(EngineCall::ConfigureScenario(credential.clone()));

        let mut state = self.shared.lock().await;
        if let Some(message) = state.scenario_failure.take() {
            return Err(EngineError::configuration(message));
        }
        state.credentials.push(credential.clone());
        Ok(())
    }

    async fn start_chip_stream(&mut self) -> Result<EngineStream<String>> {
        self.journal.record(EngineCall::StartChip);

        let mut state = self.shared.lock().await;
        if let Some(message) = state.start_failure.take() {
            return Err(EngineError::scan_failed(message));
        }

        let script = state.scripts.pop_front().unwrap_or_default();
        let (tx, stream) =
            EngineStream::channel("chip", DEFAULT_STREAM_CAPACITY.max(script.len() + 1));
        for item in script {
            tx.try_deliver(item)?;
        }
        state.live = Some(tx);

        Ok(stream)
    }

    async fn stop_chip_stream(&mut self) -> Result<()> {
        self.journal.record(EngineCall::StopChip);
        self.shared.lock().await.live = None;
        Ok(())
    }

    async fn get_info(&self) -> Result<EngineInfo> {
        Ok(EngineInfo::new(self.name.clone()).with_version("mock-1.0"))
    }
}

/// Handle for controlling a mock chip engine.
#[derive(Debug, Clone)]
pub struct MockChipHandle {
    shared: Arc<Mutex<ChipState>>,
}

impl MockChipHandle {
    /// Queue the raw messages the next chip read will deliver.
    pub async fn script_session<S: Into<String>>(&self, messages: Vec<S>) {
        self.script_stream(messages.into_iter().map(|m| Ok(m.into())).collect())
            .await;
    }

    /// Queue the items, including stream errors, the next read will deliver.
    pub async fn script_stream(&self, items: Vec<Result<String>>) {
        self.shared.lock().await.scripts.push_back(items);
    }

    /// Emit a raw message on the running read.
    ///
    /// # Errors
    ///
    /// Returns an error if no read is running or its subscriber is gone.
    pub async fn emit(&self, message: impl Into<String>) -> Result<()> {
        let tx = self.live_sender().await?;
        tx.send(message.into()).await
    }

    /// Report a stream error on the running read.
    ///
    /// # Errors
    ///
    /// Returns an error if no read is running or its subscriber is gone.
    pub async fn fail(&self, error: EngineError) -> Result<()> {
        let tx = self.live_sender().await?;
        tx.fail(error).await
    }

    /// End the running read's stream without a result.
    pub async fn close(&self) {
        self.shared.lock().await.live = None;
    }

    /// Make the next `start_chip_stream` call fail.
    pub async fn fail_next_start(&self, message: impl Into<String>) {
        self.shared.lock().await.start_failure = Some(message.into());
    }

    /// Make the next `configure_scenario` call fail.
    pub async fn reject_next_scenario(&self, message: impl Into<String>) {
        self.shared.lock().await.scenario_failure = Some(message.into());
    }

    /// Credentials accepted by `configure_scenario`, oldest first.
    pub async fn configured_credentials(&self) -> Vec<AccessCredential> {
        self.shared.lock().await.credentials.clone()
    }

    /// Settings passed to the last `apply_settings`.
    pub async fn applied_settings(&self) -> Option<RfidSettings> {
        self.shared.lock().await.settings.clone()
    }

    /// Check whether a chip stream is open.
    pub async fn is_streaming(&self) -> bool {
        self.shared
            .lock()
            .await
            .live
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    async fn live_sender(&self) -> Result<EngineStreamSender<String>> {
        self.shared
            .lock()
            .await
            .live
            .clone()
            .ok_or_else(|| EngineError::disconnected("chip read not running"))
    }
}
