//! Result presentation.
//!
//! The orchestrator reports to a [`ResultPresenter`]: database preparation
//! progress while the engines initialize, and exactly one outcome per scan.
//! Rendering (loaders, alerts, screens) is up to the implementation.

use docscan_core::ScanOutcome;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Receiver of scan progress and outcomes.
pub trait ResultPresenter: Send {
    /// A scan finished.
    fn on_scan_outcome(&mut self, outcome: &ScanOutcome);

    /// Engine preparation progress in percent.
    fn on_progress(&mut self, percent: u8);
}

/// Event forwarded by a [`ChannelPresenter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PresenterEvent {
    Progress { percent: u8 },
    Outcome { outcome: ScanOutcome },
}

/// Presenter that forwards every notification over a channel.
///
/// # Examples
///
/// ```
/// use docscan_core::{FailureKind, ScanOutcome};
/// use docscan_session::presenter::{ChannelPresenter, PresenterEvent, ResultPresenter};
///
/// let (mut presenter, mut rx) = ChannelPresenter::new();
/// presenter.on_progress(40);
/// presenter.on_scan_outcome(&ScanOutcome::failure(FailureKind::Engine));
///
/// assert_eq!(rx.try_recv().unwrap(), PresenterEvent::Progress { percent: 40 });
/// assert!(matches!(rx.try_recv().unwrap(), PresenterEvent::Outcome { .. }));
/// ```
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<PresenterEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresenterEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: PresenterEvent) {
        if self.tx.send(event).is_err() {
            warn!("Presenter receiver dropped; notification lost");
        }
    }
}

impl ResultPresenter for ChannelPresenter {
    fn on_scan_outcome(&mut self, outcome: &ScanOutcome) {
        self.forward(PresenterEvent::Outcome {
            outcome: outcome.clone(),
        });
    }

    fn on_progress(&mut self, percent: u8) {
        self.forward(PresenterEvent::Progress { percent });
    }
}

/// Presenter that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl ResultPresenter for TracingPresenter {
    fn on_scan_outcome(&mut self, outcome: &ScanOutcome) {
        match outcome {
            ScanOutcome::Success(event) => info!(
                "Scan succeeded: action {}, {} text fields",
                event.action,
                event.fields.len()
            ),
            ScanOutcome::Failure(failure) => warn!("Scan failed: {}", failure),
        }
    }

    fn on_progress(&mut self, percent: u8) {
        info!("Preparing document database: {}%", percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::{CompletionEvent, DocReaderAction};

    #[test]
    fn test_channel_presenter_preserves_order() {
        let (mut presenter, mut rx) = ChannelPresenter::new();
        let outcome = ScanOutcome::Success(CompletionEvent::new(DocReaderAction::Complete));

        presenter.on_progress(10);
        presenter.on_progress(100);
        presenter.on_scan_outcome(&outcome);

        assert_eq!(rx.try_recv().unwrap(), PresenterEvent::Progress { percent: 10 });
        assert_eq!(rx.try_recv().unwrap(), PresenterEvent::Progress { percent: 100 });
        assert_eq!(rx.try_recv().unwrap(), PresenterEvent::Outcome { outcome });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_presenter_survives_dropped_receiver() {
        let (mut presenter, rx) = ChannelPresenter::new();
        drop(rx);
        presenter.on_progress(50);
    }

    #[test]
    fn test_presenter_event_serialization() {
        let json = serde_json::to_value(PresenterEvent::Progress { percent: 7 }).unwrap();
        assert_eq!(json, serde_json::json!({"event": "progress", "percent": 7}));
    }
}
