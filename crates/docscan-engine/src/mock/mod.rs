//! Mock engine implementations for testing and development.
//!
//! This module provides simulated engines that can be scripted or driven
//! programmatically without a real capture engine. Both mocks can share an
//! [`EngineJournal`] to record the cross-engine order of calls.

pub mod chip;
pub mod optical;

use docscan_core::AccessCredential;
use std::sync::{Arc, Mutex, PoisonError};

// Re-export commonly used types
pub use chip::{MockChipEngine, MockChipHandle};
pub use optical::{MockOpticalEngine, MockOpticalHandle};

/// A call made on a mock engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    PrepareDatabase,
    Initialize,
    StartOptical,
    StopOptical,
    ApplySettings,
    ConfigureScenario(AccessCredential),
    StartChip,
    StopChip,
}

/// Shared, ordered record of engine calls.
///
/// # Examples
///
/// ```
/// use docscan_engine::mock::{EngineCall, EngineJournal};
///
/// let journal = EngineJournal::new();
/// journal.record(EngineCall::StartOptical);
/// journal.record(EngineCall::StopOptical);
///
/// assert_eq!(journal.calls(), vec![EngineCall::StartOptical, EngineCall::StopOptical]);
/// assert_eq!(journal.count(&EngineCall::StartChip), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineJournal(Arc<Mutex<Vec<EngineCall>>>);

impl EngineJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call.
    pub fn record(&self, call: EngineCall) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Snapshot of all calls so far, oldest first.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of recorded calls equal to `call`.
    pub fn count(&self, call: &EngineCall) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| *c == call)
            .count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
