//! Error types for serial port detection

use thiserror::Error;

/// Errors that can occur while finding a serial port
#[derive(Debug, Error)]
pub enum DetectError {
    /// The OS could not list its serial ports
    #[error("failed to enumerate ports: {0}")]
    EnumerationFailed(#[from] serialport::Error),

    /// Nothing to choose from
    #[error("no serial ports detected")]
    NoPorts,

    /// Console I/O failed while prompting
    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),

    /// Input ended before a valid choice was made
    #[error("no port selected")]
    NoSelection,
}
