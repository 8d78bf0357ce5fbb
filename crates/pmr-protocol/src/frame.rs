//! PMR-171 Frame Format
//!
//! Every message on the serial link is wrapped in the same envelope:
//!
//! ```text
//! A5 A5 A5 A5 [len] [cmd] [payload...] [crc_hi] [crc_lo]
//! ```
//!
//! - `A5 A5 A5 A5`: sync marker
//! - `len`: body length (command byte + payload)
//! - `cmd`: command type, see [`crate::CommandType`]
//! - `crc`: CRC-16/MODBUS over `len` and the body, big-endian
//!
//! The checksum never covers the sync marker; it is always computed over
//! exactly `1 + len` bytes.

use crc::{Crc, CRC_16_MODBUS};

use crate::error::{DecodeError, EncodeError};
use crate::ProtocolCodec;

/// Frame sync marker
pub const SYNC: [u8; 4] = [0xA5, 0xA5, 0xA5, 0xA5];
/// Sync marker plus length byte
pub const HEADER_LEN: usize = SYNC.len() + 1;
/// Trailing checksum length
pub const CRC_LEN: usize = 2;
/// Largest body the length byte can describe
pub const MAX_BODY_LEN: usize = u8::MAX as usize;
/// Largest payload that fits next to the command byte
pub const MAX_PAYLOAD_LEN: usize = MAX_BODY_LEN - 1;
/// Largest possible frame on the wire
pub const MAX_FRAME_LEN: usize = HEADER_LEN + MAX_BODY_LEN + CRC_LEN;

/// Reflected poly 0x8005 (0x18005), init 0xFFFF, no output XOR
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Compute the frame checksum over `data`
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// A decoded frame: command byte and the payload that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command type byte
    pub command: u8,
    /// Command-specific payload
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame
    pub fn new(command: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            command,
            payload: payload.into(),
        }
    }

    /// Encode this frame to its wire format
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        encode(self.command, &self.payload)
    }
}

/// Build a complete frame for `command` carrying `payload`
pub fn encode(command: u8, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(EncodeError::PayloadTooLong { len: payload.len() });
    }
    Ok(write_frame(command, payload))
}

/// Frame writer for payloads already known to fit
pub(crate) fn write_frame(command: u8, payload: &[u8]) -> Vec<u8> {
    debug_assert!(payload.len() <= MAX_PAYLOAD_LEN);

    let mut frame = Vec::with_capacity(HEADER_LEN + 1 + payload.len() + CRC_LEN);
    frame.extend_from_slice(&SYNC);
    frame.push((payload.len() + 1) as u8);
    frame.push(command);
    frame.extend_from_slice(payload);

    let crc = crc16(&frame[SYNC.len()..]);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

/// Total wire length of the frame at the start of `data`, if its header is present
///
/// Returns `None` when fewer than [`HEADER_LEN`] bytes are buffered or the
/// data does not start with the sync marker.
pub fn frame_len(data: &[u8]) -> Option<usize> {
    if data.len() < HEADER_LEN || !data.starts_with(&SYNC) {
        return None;
    }
    Some(HEADER_LEN + data[SYNC.len()] as usize + CRC_LEN)
}

/// Parse the frame at the start of `raw`
///
/// The sync marker must sit at offset 0. Bytes after the end of the frame
/// are ignored.
pub fn decode(raw: &[u8]) -> Result<Frame, DecodeError> {
    if !raw.starts_with(&SYNC) {
        return Err(DecodeError::BadSync);
    }

    let Some(&len) = raw.get(SYNC.len()) else {
        return Err(DecodeError::Truncated { needed: 1 });
    };
    let body_len = len as usize;
    if body_len == 0 {
        return Err(DecodeError::EmptyBody);
    }

    let total = HEADER_LEN + body_len + CRC_LEN;
    if raw.len() < total {
        return Err(DecodeError::Truncated {
            needed: total - raw.len(),
        });
    }

    let checked = &raw[SYNC.len()..HEADER_LEN + body_len];
    let expected = crc16(checked);
    let actual = u16::from_be_bytes([raw[total - 2], raw[total - 1]]);
    if expected != actual {
        return Err(DecodeError::BadChecksum { expected, actual });
    }

    let body = &raw[HEADER_LEN..HEADER_LEN + body_len];
    Ok(Frame::new(body[0], &body[1..]))
}

/// Streaming frame codec
///
/// Accepts bytes in arbitrary chunks, skips anything before a sync marker
/// and drops frames that fail their checksum.
pub struct FrameCodec {
    buffer: Vec<u8>,
}

impl FrameCodec {
    /// Create a new frame codec
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
        }
    }

    fn find_sync(&self) -> Option<usize> {
        self.buffer.windows(SYNC.len()).position(|w| w == SYNC)
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolCodec for FrameCodec {
    fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent unbounded growth on a noisy line
        if self.buffer.len() > MAX_FRAME_LEN * 4 {
            let start = self.buffer.len() - MAX_FRAME_LEN;
            self.buffer.drain(..start);
        }
    }

    fn next_frame(&mut self) -> Option<Frame> {
        self.next_frame_with_bytes().map(|(frame, _)| frame)
    }

    fn next_frame_with_bytes(&mut self) -> Option<(Frame, Vec<u8>)> {
        loop {
            let sync_pos = self.find_sync()?;
            if sync_pos > 0 {
                self.buffer.drain(..sync_pos);
            }

            let total = frame_len(&self.buffer)?;
            if self.buffer.len() < total {
                return None;
            }

            match decode(&self.buffer[..total]) {
                Ok(frame) => {
                    let raw: Vec<u8> = self.buffer.drain(..total).collect();
                    return Some((frame, raw));
                }
                Err(e) => {
                    tracing::warn!("Dropping PMR frame: {}", e);
                    // Resync from the next byte; a real frame may start inside this one
                    self.buffer.drain(..1);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.buffer.clear();
    }
}
