//! Error types for PMR-171 frame encoding and decoding

use thiserror::Error;

/// Errors that can occur while building a frame
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Command byte plus payload does not fit the one-byte length field
    #[error("payload too long: {len} bytes (max {max})", max = crate::frame::MAX_PAYLOAD_LEN)]
    PayloadTooLong { len: usize },
}

/// Errors that can occur while parsing frame data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Data does not start with the `A5 A5 A5 A5` sync marker
    #[error("missing sync marker")]
    BadSync,

    /// Buffer ends before the frame declared by its length byte
    #[error("truncated frame: need {needed} more bytes")]
    Truncated { needed: usize },

    /// Length byte is zero, so there is no command byte
    #[error("frame body is empty")]
    EmptyBody,

    /// CRC over length byte and body does not match the trailer
    #[error("checksum mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    BadChecksum { expected: u16, actual: u16 },

    /// Command byte is not one this bridge understands
    #[error("unknown command: 0x{0:02X}")]
    UnknownCommand(u8),

    /// Payload size does not match what the command requires
    #[error("bad payload for command 0x{command:02X}: {len} bytes")]
    BadPayload { command: u8, len: usize },
}
