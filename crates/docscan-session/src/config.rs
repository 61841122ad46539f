//! Session configuration.

use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of phase transitions kept in a session's history.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// What to do when the chip read is requested but the optical result
/// carries neither an MRZ nor a CAN field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPolicy {
    /// Start the chip read without configuring a credential.
    #[default]
    Proceed,

    /// Stop the optical capture and fail the scan.
    Abort,
}

/// Scan session settings.
///
/// # Examples
///
/// ```
/// use docscan_session::config::{CredentialPolicy, SessionConfig};
///
/// let config = SessionConfig::from_json_str(r#"{"credentialPolicy":"abort"}"#).unwrap();
/// assert_eq!(config.credential_policy, CredentialPolicy::Abort);
/// assert_eq!(config.history_size, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub credential_policy: CredentialPolicy,
    pub history_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credential_policy: CredentialPolicy::Proceed,
            history_size: DEFAULT_HISTORY_SIZE,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Json` for malformed JSON and
    /// `SessionError::Config` if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the configuration for values the session cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if `history_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.history_size == 0 {
            return Err(SessionError::config("historySize must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.credential_policy, CredentialPolicy::Proceed);
        assert_eq!(config.history_size, DEFAULT_HISTORY_SIZE);
    }

    #[rstest]
    #[case(r#"{}"#, CredentialPolicy::Proceed)]
    #[case(r#"{"credentialPolicy":"proceed"}"#, CredentialPolicy::Proceed)]
    #[case(r#"{"credentialPolicy":"abort"}"#, CredentialPolicy::Abort)]
    fn test_credential_policy_parsing(#[case] json: &str, #[case] expected: CredentialPolicy) {
        let config = SessionConfig::from_json_str(json).unwrap();
        assert_eq!(config.credential_policy, expected);
    }

    #[test]
    fn test_zero_history_rejected() {
        let result = SessionConfig::from_json_str(r#"{"historySize":0}"#);
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let result = SessionConfig::from_json_str(r#"{"credentialPolicy":"retry"}"#);
        assert!(matches!(result, Err(SessionError::Json(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"historySize":8}}"#).unwrap();

        let config = SessionConfig::from_file(file.path()).unwrap();
        assert_eq!(config.history_size, 8);
    }
}
