use crate::{
    Result,
    constants::{
        ACTION_CANCEL, ACTION_COMPLETE, ACTION_ERROR, ACTION_MORE_PAGES_AVAILABLE,
        ACTION_NOTIFICATION, ACTION_PROCESS, ACTION_PROCESS_WHITE_UV_IMAGE, SCAN_FAILED_REASON,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Action discriminator of a completion event.
///
/// Serialized as the engine's integer code. Codes the engine may add in the
/// future are kept as [`DocReaderAction::Unknown`] instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum DocReaderAction {
    Process,
    Complete,
    Cancel,
    Error,
    Notification,
    ProcessWhiteUvImage,
    MorePagesAvailable,
    Unknown(i32),
}

impl DocReaderAction {
    /// Engine wire code for this action.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Process => ACTION_PROCESS,
            Self::Complete => ACTION_COMPLETE,
            Self::Cancel => ACTION_CANCEL,
            Self::Error => ACTION_ERROR,
            Self::Notification => ACTION_NOTIFICATION,
            Self::ProcessWhiteUvImage => ACTION_PROCESS_WHITE_UV_IMAGE,
            Self::MorePagesAvailable => ACTION_MORE_PAGES_AVAILABLE,
            Self::Unknown(code) => *code,
        }
    }
}

impl From<i32> for DocReaderAction {
    fn from(code: i32) -> Self {
        match code {
            ACTION_PROCESS => Self::Process,
            ACTION_COMPLETE => Self::Complete,
            ACTION_CANCEL => Self::Cancel,
            ACTION_ERROR => Self::Error,
            ACTION_NOTIFICATION => Self::Notification,
            ACTION_PROCESS_WHITE_UV_IMAGE => Self::ProcessWhiteUvImage,
            ACTION_MORE_PAGES_AVAILABLE => Self::MorePagesAvailable,
            other => Self::Unknown(other),
        }
    }
}

impl From<DocReaderAction> for i32 {
    fn from(action: DocReaderAction) -> Self {
        action.code()
    }
}

impl fmt::Display for DocReaderAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Process => write!(f, "PROCESS"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Cancel => write!(f, "CANCEL"),
            Self::Error => write!(f, "ERROR"),
            Self::Notification => write!(f, "NOTIFICATION"),
            Self::ProcessWhiteUvImage => write!(f, "PROCESS_WHITE_UV_IMAGE"),
            Self::MorePagesAvailable => write!(f, "MORE_PAGES_AVAILABLE"),
            Self::Unknown(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// One step of a scan lifecycle as reported by the capture engine.
///
/// Text fields are keyed by the engine's field-type code. When the engine
/// reports the same field type more than once, the first value wins.
///
/// # Examples
///
/// ```
/// use docscan_core::{CompletionEvent, DocReaderAction};
/// use docscan_core::constants::FIELD_TYPE_MRZ_STRINGS;
///
/// let event = CompletionEvent::new(DocReaderAction::Complete)
///     .with_field(FIELD_TYPE_MRZ_STRINGS, "P<UTOERIKSSON<<ANNA");
///
/// assert_eq!(event.field(FIELD_TYPE_MRZ_STRINGS), Some("P<UTOERIKSSON<<ANNA"));
/// assert_eq!(event.field(159), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEvent {
    pub action: DocReaderAction,
    #[serde(default)]
    pub fields: BTreeMap<u32, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompletionEvent {
    #[must_use]
    pub fn new(action: DocReaderAction) -> Self {
        Self {
            action,
            fields: BTreeMap::new(),
            error: None,
        }
    }

    /// Add a text field, keeping an existing value for the same type.
    #[must_use]
    pub fn with_field(mut self, field_type: u32, value: impl Into<String>) -> Self {
        self.fields.entry(field_type).or_insert_with(|| value.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Value of a text field, if the engine extracted it.
    #[must_use]
    pub fn field(&self, field_type: u32) -> Option<&str> {
        self.fields.get(&field_type).map(String::as_str)
    }

    /// Parse the engine's JSON completion payload.
    ///
    /// The payload carries the action code at the top level and the text
    /// fields under `results.textResult.fields`. Fields without a value are
    /// skipped.
    ///
    /// # Errors
    /// Returns `Error::Json` if the payload is not valid JSON or misses the
    /// action code, and `Error::InvalidPayload` if it is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use docscan_core::{CompletionEvent, DocReaderAction};
    ///
    /// let raw = r#"{"action":1,"results":{"textResult":{"fields":[{"fieldType":159,"value":"A1B2C3"}]}}}"#;
    /// let event = CompletionEvent::from_json(raw).unwrap();
    ///
    /// assert_eq!(event.action, DocReaderAction::Complete);
    /// assert_eq!(event.field(159), Some("A1B2C3"));
    /// ```
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::InvalidPayload("empty payload".to_string()));
        }

        let payload: CompletionPayload = serde_json::from_str(raw)?;
        Ok(payload.into())
    }
}

/// Engine wire representation of a completion event.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionPayload {
    action: DocReaderAction,
    #[serde(default)]
    results: Option<ResultsPayload>,
    #[serde(default)]
    error: Option<ErrorPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultsPayload {
    #[serde(default)]
    text_result: Option<TextResultPayload>,
}

#[derive(Debug, Deserialize)]
struct TextResultPayload {
    #[serde(default)]
    fields: Vec<TextFieldPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextFieldPayload {
    field_type: u32,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl From<CompletionPayload> for CompletionEvent {
    fn from(payload: CompletionPayload) -> Self {
        let mut event = CompletionEvent::new(payload.action);

        let fields = payload
            .results
            .and_then(|results| results.text_result)
            .map(|text| text.fields)
            .unwrap_or_default();

        for field in fields {
            if let Some(value) = field.value {
                event = event.with_field(field.field_type, value);
            }
        }

        event.error = payload.error.map(|error| match (error.code, error.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message,
            (Some(code), None) => format!("engine error {code}"),
            (None, None) => "unspecified engine error".to_string(),
        });

        event
    }
}

/// Category of a failed scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The optical or chip engine reported a hard failure.
    Engine,
    /// A chip completion payload could not be parsed.
    Parse,
    /// No access credential could be derived and the policy forbids proceeding.
    CredentialAbsent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Engine => write!(f, "engine"),
            Self::Parse => write!(f, "parse"),
            Self::CredentialAbsent => write!(f, "credential_absent"),
        }
    }
}

/// Failure reported to the presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub kind: FailureKind,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ScanFailure {
    /// Failure with the standard user-facing reason.
    #[must_use]
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            reason: SCAN_FAILED_REASON.to_string(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for ScanFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({}: {})", self.reason, self.kind, detail),
            None => write!(f, "{} ({})", self.reason, self.kind),
        }
    }
}

/// Terminal outcome of a scan session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "payload", rename_all = "snake_case")]
pub enum ScanOutcome {
    Success(CompletionEvent),
    Failure(ScanFailure),
}

impl ScanOutcome {
    #[must_use]
    pub fn failure(kind: FailureKind) -> Self {
        Self::Failure(ScanFailure::new(kind))
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}
