//! Chip stream demultiplexing.
//!
//! The chip engine reports protocol progress (notifications, certificate and
//! signature requests) on the same stream as its final result. Progress
//! messages are recognised by a reserved prefix; anything else is the
//! completion payload.

use crate::constants::BOOKKEEPING_PREFIXES;
use crate::{CompletionEvent, Result};
use serde::{Deserialize, Serialize};

/// Classification of a raw chip stream message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfidMessageKind {
    /// Protocol progress, carries no result.
    Bookkeeping,
    /// The chip read result, to be parsed as a [`CompletionEvent`].
    CompletionPayload,
}

/// Classify a raw chip stream message by its prefix.
///
/// # Examples
///
/// ```
/// use docscan_core::rfid_filter::{RfidMessageKind, classify};
///
/// assert_eq!(classify("paCertificateCompletionEventXYZ"), RfidMessageKind::Bookkeeping);
/// assert_eq!(classify(r#"{"action":1}"#), RfidMessageKind::CompletionPayload);
/// ```
#[must_use]
pub fn classify(raw: &str) -> RfidMessageKind {
    if BOOKKEEPING_PREFIXES
        .iter()
        .any(|prefix| raw.starts_with(prefix))
    {
        RfidMessageKind::Bookkeeping
    } else {
        RfidMessageKind::CompletionPayload
    }
}

/// A chip stream message after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RfidMessage {
    Bookkeeping(String),
    Completion(CompletionEvent),
}

impl RfidMessage {
    /// Classify and, for completion payloads, parse a raw message.
    ///
    /// # Errors
    /// Returns an error if the message is a completion payload that does not
    /// parse as a [`CompletionEvent`].
    pub fn parse(raw: &str) -> Result<Self> {
        match classify(raw) {
            RfidMessageKind::Bookkeeping => Ok(Self::Bookkeeping(raw.to_string())),
            RfidMessageKind::CompletionPayload => {
                CompletionEvent::from_json(raw).map(Self::Completion)
            }
        }
    }
}
