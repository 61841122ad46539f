//! Capture engine configuration payloads.
//!
//! [`ReaderConfig`] mirrors the settings the capture engine accepts at
//! initialization: capture UI behaviour, processing parameters and the base
//! chip reading scenario. Defaults reproduce an OCR-first setup where the
//! chip read is started explicitly by the scan session rather than by the
//! engine (`doRfid = false`).
//!
//! Every section uses `#[serde(default)]`, so a JSON file only needs the
//! keys it changes:
//!
//! ```
//! use docscan_engine::config::ReaderConfig;
//!
//! let config = ReaderConfig::from_json_str(r#"{"processParams": {"dateFormat": "dd.mm.yyyy"}}"#)
//!     .unwrap();
//!
//! assert_eq!(config.process_params.date_format, "dd.mm.yyyy");
//! assert_eq!(config.process_params.scenario, "Ocr");
//! ```

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Number of data groups on an ePassport (ICAO 9303).
pub const EPASSPORT_DATA_GROUPS: u8 = 16;

/// Number of data groups on an eID card.
pub const EID_DATA_GROUPS: u8 = 21;

/// Number of data groups on an electronic driving licence.
pub const EDL_DATA_GROUPS: u8 = 14;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    pub functionality: Functionality,
    pub customization: Customization,
    pub process_params: ProcessParams,
    pub rfid: RfidSettings,
}

impl ReaderConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns `EngineError::Json` for malformed JSON and
    /// `EngineError::ConfigurationError` if validation fails.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `EngineError::Io` if the file cannot be read, otherwise the
    /// same errors as [`ReaderConfig::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the configuration for values the engine would reject.
    ///
    /// # Errors
    /// Returns `EngineError::ConfigurationError` describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.process_params.scenario.trim().is_empty() {
            return Err(EngineError::configuration("processing scenario is empty"));
        }
        if self.process_params.date_format.trim().is_empty() {
            return Err(EngineError::configuration("date format is empty"));
        }
        if self.process_params.do_rfid {
            return Err(EngineError::configuration(
                "doRfid must be false: the scan session starts the chip read itself",
            ));
        }

        self.rfid
            .e_passport_data_groups
            .validate("ePassport", EPASSPORT_DATA_GROUPS)?;
        self.rfid.eid_data_groups.validate("eID", EID_DATA_GROUPS)?;
        self.rfid.edl_data_groups.validate("eDL", EDL_DATA_GROUPS)?;

        Ok(())
    }
}

/// Capture UI behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Functionality {
    pub video_capture_motion_control: bool,
    pub show_capture_button: bool,
    pub camera_frame: CameraFrame,
    /// Seconds after document detection before the capture button appears.
    pub show_capture_button_delay_from_detect: u32,
    pub show_change_frame_button: bool,
}

impl Default for Functionality {
    fn default() -> Self {
        Self {
            video_capture_motion_control: true,
            show_capture_button: true,
            camera_frame: CameraFrame::Document,
            show_capture_button_delay_from_detect: 1,
            show_change_frame_button: true,
        }
    }
}

/// Shape of the camera frame overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFrame {
    #[default]
    Document,
    Max,
    None,
}

/// Status message customization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Customization {
    pub show_result_status_messages: bool,
    pub show_status_messages: bool,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            show_result_status_messages: true,
            show_status_messages: true,
        }
    }
}

/// Document processing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessParams {
    pub scenario: String,
    pub do_rfid: bool,
    pub date_format: String,
    pub multipage_processing: bool,
    pub debug_save_logs: bool,
    pub debug_save_cropped_images: bool,
    #[serde(rename = "debugSaveRFIDSession")]
    pub debug_save_rfid_session: bool,
}

impl Default for ProcessParams {
    fn default() -> Self {
        Self {
            scenario: "Ocr".to_string(),
            do_rfid: false,
            date_format: "yyyy-mm-dd".to_string(),
            multipage_processing: true,
            debug_save_logs: true,
            debug_save_cropped_images: true,
            debug_save_rfid_session: true,
        }
    }
}

/// How the chip engine handles passive authentication certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RfidDelegate {
    Null,
    #[default]
    NoPa,
    Full,
}

/// Base chip reading scenario applied at initialization.
///
/// The access credential is not part of this; it is configured per session
/// once the optical scan has produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RfidSettings {
    pub delegate: RfidDelegate,
    pub auto_settings: bool,
    #[serde(rename = "readEPassport")]
    pub read_e_passport: bool,
    #[serde(rename = "ePassportDataGroups")]
    pub e_passport_data_groups: DataGroups,
    #[serde(rename = "readEID")]
    pub read_eid: bool,
    #[serde(rename = "eIDDataGroups")]
    pub eid_data_groups: DataGroups,
    #[serde(rename = "readEDL")]
    pub read_edl: bool,
    #[serde(rename = "eDLDataGroups")]
    pub edl_data_groups: DataGroups,
}

impl Default for RfidSettings {
    fn default() -> Self {
        Self {
            delegate: RfidDelegate::NoPa,
            auto_settings: true,
            read_e_passport: true,
            e_passport_data_groups: DataGroups::disabled(EPASSPORT_DATA_GROUPS),
            read_eid: false,
            eid_data_groups: DataGroups::disabled(EID_DATA_GROUPS),
            read_edl: false,
            edl_data_groups: DataGroups::disabled(EDL_DATA_GROUPS),
        }
    }
}

/// Data group selection keyed `DG1`..`DGn`, as the engine expects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataGroups(BTreeMap<String, bool>);

impl DataGroups {
    /// Selection with `count` groups, all disabled.
    pub fn disabled(count: u8) -> Self {
        Self((1..=count).map(|n| (Self::key(n), false)).collect())
    }

    /// Enable a data group.
    pub fn enable(&mut self, group: u8) {
        self.0.insert(Self::key(group), true);
    }

    /// Check whether a data group is enabled.
    pub fn is_enabled(&self, group: u8) -> bool {
        self.0.get(&Self::key(group)).copied().unwrap_or(false)
    }

    /// Number of groups listed.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn key(group: u8) -> String {
        format!("DG{group}")
    }

    fn validate(&self, document: &str, max: u8) -> Result<()> {
        for key in self.0.keys() {
            let group = key
                .strip_prefix("DG")
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=max).contains(n));

            if group.is_none() {
                return Err(EngineError::configuration(format!(
                    "{document} data group {key} is not one of DG1-DG{max}"
                )));
            }
        }
        Ok(())
    }
}
