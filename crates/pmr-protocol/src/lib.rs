//! PMR-171 Protocol Library
//!
//! This crate provides framing and encoding for the binary serial protocol
//! spoken by the Guohe PMR-171 transceiver:
//!
//! - **Frames**: `A5 A5 A5 A5` sync, one length byte, command byte, payload
//!   and a big-endian CRC-16/MODBUS over length and body
//! - **Commands**: set frequency, set mode, set PTT and query status
//! - **Modes**: the fixed id ↔ name table used on the wire
//! - **Status**: field extraction from query-status responses
//!
//! # Example
//!
//! ```rust
//! use pmr_protocol::{EncodeCommand, FrameCodec, Mode, PmrCommand, ProtocolCodec};
//!
//! let bytes = PmrCommand::SetMode { mode: Mode::Lsb }.encode();
//!
//! let mut codec = FrameCodec::new();
//! codec.push_bytes(&bytes);
//!
//! let frame = codec.next_frame().unwrap();
//! let cmd = PmrCommand::from_frame(&frame).unwrap();
//! assert_eq!(cmd, PmrCommand::SetMode { mode: Mode::Lsb });
//! ```

pub mod command;
pub mod error;
pub mod frame;
pub mod mode;
pub mod status;

pub use command::{CommandType, PmrCommand};
pub use error::{DecodeError, EncodeError};
pub use frame::{decode, encode, Frame, FrameCodec};
pub use mode::Mode;
pub use status::StatusReport;

/// Trait for codecs that parse incoming byte streams into frames
pub trait ProtocolCodec {
    /// Push raw bytes into the codec's buffer
    fn push_bytes(&mut self, data: &[u8]);

    /// Try to extract the next complete frame from the buffer
    fn next_frame(&mut self) -> Option<Frame>;

    /// Try to extract the next complete frame along with its raw bytes
    ///
    /// Useful for traffic logging where the exact bytes matter.
    fn next_frame_with_bytes(&mut self) -> Option<(Frame, Vec<u8>)>;

    /// Clear the internal buffer
    fn clear(&mut self);
}

/// Trait for commands that can be encoded to bytes
pub trait EncodeCommand {
    /// Encode this command to its wire format
    fn encode(&self) -> Vec<u8>;
}
