//! Common types shared across engine implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic engine information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Engine name (e.g., "Mock Optical Engine").
    pub name: String,

    /// Optional engine/core version string.
    pub version: Option<String>,

    /// Optional document database identifier.
    pub database_id: Option<String>,
}

impl EngineInfo {
    /// Create a new EngineInfo with required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            database_id: None,
        }
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the database identifier.
    pub fn with_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = Some(database_id.into());
        self
    }
}

/// Progress report from document database preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreparationStatus {
    /// Download/unpack progress in percent (0-100).
    Progress(u8),

    /// Database is ready; the engine can be initialized.
    Prepared,
}

/// Which of the two capture modalities a stream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Optical document capture.
    Optical,

    /// Contactless chip read.
    Chip,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optical => write!(f, "optical"),
            Self::Chip => write!(f, "chip"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_info_builder() {
        let info = EngineInfo::new("Optical")
            .with_version("7.1")
            .with_database_id("Full");

        assert_eq!(info.name, "Optical");
        assert_eq!(info.version.as_deref(), Some("7.1"));
        assert_eq!(info.database_id.as_deref(), Some("Full"));
    }

    #[test]
    fn test_stream_kind_display() {
        assert_eq!(StreamKind::Optical.to_string(), "optical");
        assert_eq!(StreamKind::Chip.to_string(), "chip");
    }

    #[test]
    fn test_preparation_status_serialization() {
        let json = serde_json::to_string(&PreparationStatus::Progress(42)).unwrap();
        assert_eq!(json, r#"{"progress":42}"#);
        let json = serde_json::to_string(&PreparationStatus::Prepared).unwrap();
        assert_eq!(json, r#""prepared""#);
    }
}
