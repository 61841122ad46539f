//! Chip access credential derivation.
//!
//! A contactless read of an identity document needs a PACE password. The
//! password comes from the optical scan of the same document: the MRZ key
//! line when the engine extracted one, otherwise the card access number.
//!
//! ```
//! use docscan_core::{CompletionEvent, DocReaderAction};
//! use docscan_core::credential::{PasswordType, derive_credential};
//!
//! let event = CompletionEvent::new(DocReaderAction::Complete)
//!     .with_field(51, "M123<<<")
//!     .with_field(159, "A1B2C3");
//!
//! let credential = derive_credential(&event.fields).unwrap();
//! assert_eq!(credential.secret(), "M123<<<");
//! assert_eq!(credential.password_type(), PasswordType::FromMrz);
//! ```

use crate::constants::{
    FIELD_TYPE_CARD_ACCESS_NUMBER, FIELD_TYPE_MRZ_STRINGS, PACE_PASSWORD_CAN, PACE_PASSWORD_MRZ,
};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use subtle::ConstantTimeEq;

/// Source of a PACE password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordType {
    FromMrz,
    FromCan,
}

impl PasswordType {
    /// Value the chip engine expects in its scenario.
    #[must_use]
    pub fn wire_value(&self) -> u8 {
        match self {
            Self::FromMrz => PACE_PASSWORD_MRZ,
            Self::FromCan => PACE_PASSWORD_CAN,
        }
    }
}

impl fmt::Display for PasswordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::FromMrz => write!(f, "MRZ"),
            Self::FromCan => write!(f, "CAN"),
        }
    }
}

/// Credential used to open a PACE session with the document chip.
///
/// # Security
/// The secret is redacted from `Debug` output and compared in constant time.
/// The type is never serialized; deserialization goes through
/// [`AccessCredential::new`] and rejects values that sanitize to nothing.
#[derive(Clone, Eq, Deserialize)]
#[serde(try_from = "RawCredential")]
pub struct AccessCredential {
    secret: String,
    password_type: PasswordType,
}

impl AccessCredential {
    /// Build a credential from a raw field value.
    ///
    /// Control characters (the engine leaves line breaks in multi-line MRZ
    /// values) are stripped. Returns `None` when nothing is left.
    #[must_use]
    pub fn new(raw: &str, password_type: PasswordType) -> Option<Self> {
        let secret = sanitize(raw);
        if secret.is_empty() {
            return None;
        }

        Some(Self {
            secret,
            password_type,
        })
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    #[must_use]
    pub fn password_type(&self) -> PasswordType {
        self.password_type
    }
}

#[derive(Deserialize)]
struct RawCredential {
    secret: String,
    password_type: PasswordType,
}

impl TryFrom<RawCredential> for AccessCredential {
    type Error = Error;

    fn try_from(raw: RawCredential) -> Result<Self> {
        Self::new(&raw.secret, raw.password_type).ok_or(Error::EmptyCredential)
    }
}

impl PartialEq for AccessCredential {
    fn eq(&self, other: &Self) -> bool {
        let same_secret: bool = self.secret.as_bytes().ct_eq(other.secret.as_bytes()).into();
        same_secret && self.password_type == other.password_type
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCredential")
            .field("secret", &"<redacted>")
            .field("password_type", &self.password_type)
            .finish()
    }
}

fn sanitize(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_control()).collect()
}

/// Derive the chip access credential from extracted text fields.
///
/// The MRZ key line (field 51) always takes precedence over the card access
/// number (field 159). Returns `None` if neither yields a usable value; the
/// caller decides whether a chip read may proceed without one.
#[must_use]
pub fn derive_credential(fields: &BTreeMap<u32, String>) -> Option<AccessCredential> {
    fields
        .get(&FIELD_TYPE_MRZ_STRINGS)
        .and_then(|mrz| AccessCredential::new(mrz, PasswordType::FromMrz))
        .or_else(|| {
            fields
                .get(&FIELD_TYPE_CARD_ACCESS_NUMBER)
                .and_then(|can| AccessCredential::new(can, PasswordType::FromCan))
        })
}
