//! Error types for the scan session crate.
//!
//! These cover the operations around a scan, such as engine initialization
//! and configuration loading. A scan itself never returns an error: every
//! failure during a scan becomes a [`ScanOutcome::Failure`](docscan_core::ScanOutcome).

use docscan_engine::EngineError;
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised outside of a running scan.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An engine operation failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Session configuration is invalid.
    #[error("invalid session configuration: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
