//! Core types for the docscan capture orchestrator.
//!
//! This crate holds the data model shared by the engines and the scan
//! session: completion events and their wire format, scan outcomes, the
//! chip access credential deriver and the chip stream filter.

pub mod constants;
pub mod credential;
pub mod error;
pub mod rfid_filter;
pub mod types;

pub use credential::{AccessCredential, PasswordType, derive_credential};
pub use error::{Error, Result};
pub use rfid_filter::{RfidMessage, RfidMessageKind, classify};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
