//! Mock optical capture engine for testing and development.
//!
//! Each call to `start_optical_stream` opens a fresh stream. If a script was
//! queued through the handle, its items are delivered immediately; the
//! stream then stays open so the handle can emit further events until the
//! capture is stopped.

use crate::{
    EngineError, Result,
    config::ReaderConfig,
    mock::{EngineCall, EngineJournal},
    stream::{DEFAULT_STREAM_CAPACITY, EngineStream, EngineStreamSender},
    traits::OpticalEngine,
    types::{EngineInfo, PreparationStatus},
};
use docscan_core::CompletionEvent;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock optical engine.
///
/// # Examples
///
/// ```
/// use docscan_core::{CompletionEvent, DocReaderAction};
/// use docscan_engine::mock::MockOpticalEngine;
/// use docscan_engine::traits::OpticalEngine;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> docscan_engine::Result<()> {
///     let (mut engine, handle) = MockOpticalEngine::new();
///     handle
///         .script_session(vec![CompletionEvent::new(DocReaderAction::Complete)])
///         .await;
///
///     let mut stream = engine.start_optical_stream().await?;
///     let event = stream.recv().await.unwrap()?;
///     assert_eq!(event.action, DocReaderAction::Complete);
///
///     engine.stop_optical_stream().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockOpticalEngine {
    /// Engine name
    name: String,

    /// State shared with the handle
    shared: Arc<Mutex<OpticalState>>,

    /// Call record
    journal: EngineJournal,
}

#[derive(Debug)]
struct OpticalState {
    scripts: VecDeque<Vec<Result<CompletionEvent>>>,
    live: Option<EngineStreamSender<CompletionEvent>>,
    preparation: Vec<PreparationStatus>,
    config: Option<ReaderConfig>,
    start_failure: Option<String>,
}

impl MockOpticalEngine {
    /// Create a new mock optical engine with the default name.
    pub fn new() -> (Self, MockOpticalHandle) {
        Self::with_name("Mock Optical Engine".to_string())
    }

    /// Create a new mock optical engine with a custom name.
    pub fn with_name(name: String) -> (Self, MockOpticalHandle) {
        Self::with_journal(name, EngineJournal::new())
    }

    /// Create a mock optical engine that records into a shared journal.
    pub fn with_journal(name: String, journal: EngineJournal) -> (Self, MockOpticalHandle) {
        let shared = Arc::new(Mutex::new(OpticalState {
            scripts: VecDeque::new(),
            live: None,
            preparation: vec![
                PreparationStatus::Progress(50),
                PreparationStatus::Progress(100),
                PreparationStatus::Prepared,
            ],
            config: None,
            start_failure: None,
        }));

        let engine = Self {
            name,
            shared: Arc::clone(&shared),
            journal,
        };

        (engine, MockOpticalHandle { shared })
    }

    /// Journal this engine records into.
    pub fn journal(&self) -> EngineJournal {
        self.journal.clone()
    }
}

impl Default for MockOpticalEngine {
    fn default() -> Self {
        Self::new().0
    }
}

impl OpticalEngine for MockOpticalEngine {
    async fn prepare_database(&mut self) -> Result<EngineStream<PreparationStatus>> {
        self.journal.record(EngineCall::PrepareDatabase);

        let statuses = self.shared.lock().await.preparation.clone();
        let (tx, stream) = EngineStream::channel("preparation", statuses.len());
        for status in statuses {
            tx.try_deliver(Ok(status))?;
        }

        Ok(stream)
    }

    async fn initialize(&mut self, config: &ReaderConfig) -> Result<()> {
        self.journal.record(EngineCall::Initialize);
        config.validate()?;
        self.shared.lock().await.config = Some(config.clone());
        Ok(())
    }

    async fn start_optical_stream(&mut self) -> Result<EngineStream<CompletionEvent>> {
        self.journal.record(EngineCall::StartOptical);

        let mut state = self.shared.lock().await;
        if let Some(message) = state.start_failure.take() {
            return Err(EngineError::scan_failed(message));
        }

        let script = state.scripts.pop_front().unwrap_or_default();
        let (tx, stream) =
            EngineStream::channel("optical", DEFAULT_STREAM_CAPACITY.max(script.len() + 1));
        for item in script {
            tx.try_deliver(item)?;
        }
        state.live = Some(tx);

        Ok(stream)
    }

    async fn stop_optical_stream(&mut self) -> Result<()> {
        self.journal.record(EngineCall::StopOptical);
        self.shared.lock().await.live = None;
        Ok(())
    }

    async fn get_info(&self) -> Result<EngineInfo> {
        Ok(EngineInfo::new(self.name.clone())
            .with_version("mock-1.0")
            .with_database_id("Full"))
    }
}

/// Handle for controlling a mock optical engine.
#[derive(Debug, Clone)]
pub struct MockOpticalHandle {
    shared: Arc<Mutex<OpticalState>>,
}

impl MockOpticalHandle {
    /// Queue the events the next optical capture will deliver.
    pub async fn script_session(&self, events: Vec<CompletionEvent>) {
        self.script_stream(events.into_iter().map(Ok).collect()).await;
    }

    /// Queue the items, including stream errors, the next capture will deliver.
    pub async fn script_stream(&self, items: Vec<Result<CompletionEvent>>) {
        self.shared.lock().await.scripts.push_back(items);
    }

    /// Emit an event on the running capture.
    ///
    /// # Errors
    ///
    /// Returns an error if no capture is running or its subscriber is gone.
    pub async fn emit(&self, event: CompletionEvent) -> Result<()> {
        let tx = self.live_sender().await?;
        tx.send(event).await
    }

    /// Report a stream error on the running capture.
    ///
    /// # Errors
    ///
    /// Returns an error if no capture is running or its subscriber is gone.
    pub async fn fail(&self, error: EngineError) -> Result<()> {
        let tx = self.live_sender().await?;
        tx.fail(error).await
    }

    /// End the running capture's stream without a result.
    pub async fn close(&self) {
        self.shared.lock().await.live = None;
    }

    /// Make the next `start_optical_stream` call fail.
    pub async fn fail_next_start(&self, message: impl Into<String>) {
        self.shared.lock().await.start_failure = Some(message.into());
    }

    /// Replace the database preparation statuses.
    pub async fn set_preparation(&self, statuses: Vec<PreparationStatus>) {
        self.shared.lock().await.preparation = statuses;
    }

    /// Configuration passed to the last successful `initialize`.
    pub async fn initialized_config(&self) -> Option<ReaderConfig> {
        self.shared.lock().await.config.clone()
    }

    /// Check whether a capture stream is open.
    pub async fn is_streaming(&self) -> bool {
        self.shared
            .lock()
            .await
            .live
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    async fn live_sender(&self) -> Result<EngineStreamSender<CompletionEvent>> {
        self.shared
            .lock()
            .await
            .live
            .clone()
            .ok_or_else(|| EngineError::disconnected("optical capture not running"))
    }
}
