//! Error types for the rigctl bridge

use std::path::PathBuf;

use pmr_protocol::DecodeError;
use thiserror::Error;

/// Errors that can occur while talking to the radio
///
/// Query operations never surface these to rigctl clients; they are
/// logged and replaced by a default value.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error on the serial link
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to open the serial device
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Nothing arrived before the query deadline
    #[error("no response from radio")]
    NoResponse,

    /// Response could not be decoded
    #[error("bad response: {0}")]
    Decode(#[from] DecodeError),
}

/// Errors that can occur while loading or saving settings
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No config directory could be determined
    #[error("could not determine settings path")]
    NoSettingsPath,

    /// Settings file could not be read
    #[error("failed to read settings {}: {source}", path.display())]
    SettingsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Settings file is not valid JSON for [`crate::Settings`]
    #[error("failed to parse settings {}: {source}", path.display())]
    SettingsParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Settings file could not be written
    #[error("failed to write settings {}: {source}", path.display())]
    SettingsWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
