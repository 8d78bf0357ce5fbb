//! Query-status response layout
//!
//! The radio answers a query-status command (0x0B) with a status blob from
//! which both the operating mode and the VFO-A frequency are read.
//!
//! Offsets are relative to the payload, i.e. the byte after the command
//! byte (offset 6 of the raw frame):
//!
//! ```text
//! [mode] [mode] [--] [--] [vfo_a: u32 BE] [vfo_b: u32 BE]
//! ```
//!
//! These offsets have not been confirmed against a capture from a real
//! device. Keep them here so a correction touches one place.

use crate::error::DecodeError;
use crate::frame::{decode, Frame};
use crate::mode::Mode;

/// Payload offset of the mode id
pub const MODE_OFFSET: usize = 0;
/// Payload offset of the VFO-A frequency
pub const VFO_A_OFFSET: usize = 4;
/// Payload offset of the VFO-B frequency
pub const VFO_B_OFFSET: usize = 8;
/// Payload length of a full status report
pub const STATUS_PAYLOAD_LEN: usize = VFO_B_OFFSET + 4;

/// Decoded status report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusReport {
    /// Current operating mode
    pub mode: Mode,
    /// VFO-A frequency in Hz
    pub vfo_a_hz: u32,
    /// VFO-B frequency in Hz
    pub vfo_b_hz: u32,
}

impl StatusReport {
    /// Serialize to a status payload
    pub fn to_payload(&self) -> Vec<u8> {
        let mut payload = vec![0u8; STATUS_PAYLOAD_LEN];
        payload[MODE_OFFSET] = self.mode.id();
        payload[MODE_OFFSET + 1] = self.mode.id();
        payload[VFO_A_OFFSET..VFO_A_OFFSET + 4].copy_from_slice(&self.vfo_a_hz.to_be_bytes());
        payload[VFO_B_OFFSET..VFO_B_OFFSET + 4].copy_from_slice(&self.vfo_b_hz.to_be_bytes());
        payload
    }

    /// Parse a full status payload
    pub fn from_payload(command: u8, payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() < STATUS_PAYLOAD_LEN {
            return Err(DecodeError::BadPayload {
                command,
                len: payload.len(),
            });
        }
        Ok(Self {
            mode: mode_field(command, payload)?,
            vfo_a_hz: u32_field(command, payload, VFO_A_OFFSET)?,
            vfo_b_hz: u32_field(command, payload, VFO_B_OFFSET)?,
        })
    }
}

/// Extract the operating mode from a raw query-status response
///
/// Unknown mode ids map to USB; only a missing field is an error.
pub fn mode_from_response(raw: &[u8]) -> Result<Mode, DecodeError> {
    let Frame { command, payload } = decode(raw)?;
    mode_field(command, &payload)
}

/// Extract the VFO-A frequency from a raw query-status response
pub fn frequency_from_response(raw: &[u8]) -> Result<u32, DecodeError> {
    let Frame { command, payload } = decode(raw)?;
    u32_field(command, &payload, VFO_A_OFFSET)
}

fn mode_field(command: u8, payload: &[u8]) -> Result<Mode, DecodeError> {
    payload
        .get(MODE_OFFSET)
        .map(|&id| Mode::from_id(id))
        .ok_or(DecodeError::BadPayload {
            command,
            len: payload.len(),
        })
}

fn u32_field(command: u8, payload: &[u8], offset: usize) -> Result<u32, DecodeError> {
    payload
        .get(offset..offset + 4)
        .and_then(|bytes| <[u8; 4]>::try_from(bytes).ok())
        .map(u32::from_be_bytes)
        .ok_or(DecodeError::BadPayload {
            command,
            len: payload.len(),
        })
}
