//! Core constants shared with the document capture engine.
//!
//! The values in this module are part of the engine's schema, not tunables.
//! Field-type codes, action codes and the chip stream's bookkeeping tokens
//! must match the engine bit for bit; changing any of them silently breaks
//! credential derivation or chip stream demultiplexing.
//!
//! # Usage
//!
//! ```
//! use docscan_core::constants::*;
//!
//! assert_eq!(FIELD_TYPE_MRZ_STRINGS, 51);
//! assert_eq!(FIELD_TYPE_CARD_ACCESS_NUMBER, 159);
//! assert!(BOOKKEEPING_PREFIXES.contains(&PA_CERTIFICATE_EVENT));
//! ```

// ============================================================================
// Text Field Types
// ============================================================================

/// Field type carrying the machine-readable zone key line.
///
/// Preferred source for the chip access credential.
pub const FIELD_TYPE_MRZ_STRINGS: u32 = 51;

/// Field type carrying the card access number (CAN).
///
/// Fallback source for the chip access credential when no MRZ was read.
pub const FIELD_TYPE_CARD_ACCESS_NUMBER: u32 = 159;

// ============================================================================
// Completion Action Codes
// ============================================================================

/// Engine is still processing the current frame.
pub const ACTION_PROCESS: i32 = 0;

/// Processing of the document finished.
pub const ACTION_COMPLETE: i32 = 1;

/// User cancelled the capture.
pub const ACTION_CANCEL: i32 = 2;

/// Engine reported a hard failure.
pub const ACTION_ERROR: i32 = 3;

/// Informational notification from the engine.
pub const ACTION_NOTIFICATION: i32 = 5;

/// Engine is processing the white UV image.
pub const ACTION_PROCESS_WHITE_UV_IMAGE: i32 = 6;

/// First page finished, further pages may follow.
pub const ACTION_MORE_PAGES_AVAILABLE: i32 = 8;

// ============================================================================
// Chip Stream Bookkeeping Tokens
// ============================================================================

/// Prefix of chip notification messages.
pub const RFID_NOTIFICATION_EVENT: &str = "rfidNotificationCompletionEvent";

/// Prefix of passive-authentication certificate requests.
pub const PA_CERTIFICATE_EVENT: &str = "paCertificateCompletionEvent";

/// Prefix of terminal-authentication certificate requests.
pub const TA_CERTIFICATE_EVENT: &str = "taCertificateCompletionEvent";

/// Prefix of terminal-authentication signature requests.
pub const TA_SIGNATURE_EVENT: &str = "taSignatureCompletionEvent";

/// All reserved prefixes that mark a chip stream message as bookkeeping.
///
/// # Examples
///
/// ```
/// use docscan_core::constants::BOOKKEEPING_PREFIXES;
///
/// assert_eq!(BOOKKEEPING_PREFIXES.len(), 4);
/// ```
pub const BOOKKEEPING_PREFIXES: [&str; 4] = [
    RFID_NOTIFICATION_EVENT,
    PA_CERTIFICATE_EVENT,
    TA_CERTIFICATE_EVENT,
    TA_SIGNATURE_EVENT,
];

// ============================================================================
// PACE Password Types
// ============================================================================

/// Wire value of a PACE password derived from the MRZ.
pub const PACE_PASSWORD_MRZ: u8 = 1;

/// Wire value of a PACE password derived from the CAN.
pub const PACE_PASSWORD_CAN: u8 = 2;

// ============================================================================
// Outcomes
// ============================================================================

/// Reason reported to the presenter for every failed scan.
pub const SCAN_FAILED_REASON: &str = "scan failed";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookkeeping_prefixes_are_distinct() {
        for (i, a) in BOOKKEEPING_PREFIXES.iter().enumerate() {
            for b in BOOKKEEPING_PREFIXES.iter().skip(i + 1) {
                assert_ne!(a, b);
                assert!(!a.starts_with(b) && !b.starts_with(a));
            }
        }
    }

    #[test]
    fn test_action_codes_are_unique() {
        let codes = [
            ACTION_PROCESS,
            ACTION_COMPLETE,
            ACTION_CANCEL,
            ACTION_ERROR,
            ACTION_NOTIFICATION,
            ACTION_PROCESS_WHITE_UV_IMAGE,
            ACTION_MORE_PAGES_AVAILABLE,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
