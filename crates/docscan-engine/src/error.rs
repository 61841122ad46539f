//! Error types for engine operations.
//!
//! This module defines the failures the optical and chip engines can report,
//! from lost connections and closed event streams to rejected configuration.

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Engine is not available or has been torn down.
    #[error("Engine disconnected: {engine}")]
    Disconnected { engine: String },

    /// An event stream ended before delivering a result.
    #[error("Event stream closed: {stream}")]
    StreamClosed { stream: String },

    /// Engine or database initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Engine rejected a configuration or scenario.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// The engine reported a failed capture.
    #[error("Scan failed: {message}")]
    ScanFailed { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON configuration or payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Create a new disconnected error.
    pub fn disconnected(engine: impl Into<String>) -> Self {
        Self::Disconnected {
            engine: engine.into(),
        }
    }

    /// Create a new stream closed error.
    pub fn stream_closed(stream: impl Into<String>) -> Self {
        Self::StreamClosed {
            stream: stream.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a new scan failed error.
    pub fn scan_failed(message: impl Into<String>) -> Self {
        Self::ScanFailed {
            message: message.into(),
        }
    }
}
