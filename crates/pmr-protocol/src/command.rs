//! PMR-171 command set
//!
//! The bridge only speaks four opcodes. Setters carry fixed-size payloads;
//! the query-status opcode is sent empty and answered with a status blob
//! under the same opcode.
//!
//! | Opcode | Command | Payload |
//! |--------|---------|---------|
//! | `0x07` | Set PTT | `00` transmit / `01` receive |
//! | `0x09` | Set frequency | VFO A, VFO B as `u32` BE (written identically) |
//! | `0x0A` | Set mode | mode id, twice |
//! | `0x0B` | Query status | empty (request) / status blob (response) |

use crate::error::DecodeError;
use crate::frame::{write_frame, Frame};
use crate::mode::Mode;
use crate::status::StatusReport;
use crate::EncodeCommand;

/// Command type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandType {
    /// Set transmit/receive state
    SetPtt = 0x07,
    /// Set VFO frequencies
    SetFrequency = 0x09,
    /// Set operating mode
    SetMode = 0x0A,
    /// Query radio status
    QueryStatus = 0x0B,
}

impl CommandType {
    /// Wire value of this command type
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            CommandType::SetPtt => "set-ptt",
            CommandType::SetFrequency => "set-frequency",
            CommandType::SetMode => "set-mode",
            CommandType::QueryStatus => "query-status",
        }
    }
}

impl TryFrom<u8> for CommandType {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x07 => Ok(Self::SetPtt),
            0x09 => Ok(Self::SetFrequency),
            0x0A => Ok(Self::SetMode),
            0x0B => Ok(Self::QueryStatus),
            _ => Err(DecodeError::UnknownCommand(value)),
        }
    }
}

/// PTT payload byte for transmit
pub const PTT_TRANSMIT: u8 = 0x00;
/// PTT payload byte for receive
pub const PTT_RECEIVE: u8 = 0x01;

/// Parsed PMR-171 command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PmrCommand {
    /// Set both VFO fields to `hz`
    SetFrequency { hz: u32 },
    /// Set the operating mode
    SetMode { mode: Mode },
    /// Request a status report
    QueryStatus,
    /// Status report (radio → bridge)
    StatusReport(StatusReport),
    /// Key or unkey the transmitter
    SetPtt { transmit: bool },
}

impl PmrCommand {
    /// Command type used on the wire
    pub fn command_type(&self) -> CommandType {
        match self {
            PmrCommand::SetFrequency { .. } => CommandType::SetFrequency,
            PmrCommand::SetMode { .. } => CommandType::SetMode,
            PmrCommand::QueryStatus | PmrCommand::StatusReport(_) => CommandType::QueryStatus,
            PmrCommand::SetPtt { .. } => CommandType::SetPtt,
        }
    }

    /// Payload bytes following the command byte
    pub fn payload(&self) -> Vec<u8> {
        match self {
            PmrCommand::SetFrequency { hz } => {
                let mut payload = Vec::with_capacity(8);
                payload.extend_from_slice(&hz.to_be_bytes());
                payload.extend_from_slice(&hz.to_be_bytes());
                payload
            }
            PmrCommand::SetMode { mode } => vec![mode.id(), mode.id()],
            PmrCommand::QueryStatus => Vec::new(),
            PmrCommand::StatusReport(report) => report.to_payload(),
            PmrCommand::SetPtt { transmit } => {
                vec![if *transmit { PTT_TRANSMIT } else { PTT_RECEIVE }]
            }
        }
    }

    /// Interpret a decoded frame
    ///
    /// A set-frequency frame is accepted only when both VFO fields agree.
    pub fn from_frame(frame: &Frame) -> Result<Self, DecodeError> {
        let bad_payload = || DecodeError::BadPayload {
            command: frame.command,
            len: frame.payload.len(),
        };
        let payload = frame.payload.as_slice();

        match CommandType::try_from(frame.command)? {
            CommandType::SetFrequency => {
                let [a0, a1, a2, a3, b0, b1, b2, b3] =
                    <[u8; 8]>::try_from(payload).map_err(|_| bad_payload())?;
                let vfo_a = u32::from_be_bytes([a0, a1, a2, a3]);
                let vfo_b = u32::from_be_bytes([b0, b1, b2, b3]);
                if vfo_a != vfo_b {
                    return Err(bad_payload());
                }
                Ok(PmrCommand::SetFrequency { hz: vfo_a })
            }
            CommandType::SetMode => match payload {
                [id, _] => Ok(PmrCommand::SetMode {
                    mode: Mode::from_id(*id),
                }),
                _ => Err(bad_payload()),
            },
            CommandType::QueryStatus if payload.is_empty() => Ok(PmrCommand::QueryStatus),
            CommandType::QueryStatus => Ok(PmrCommand::StatusReport(
                StatusReport::from_payload(frame.command, payload)?,
            )),
            CommandType::SetPtt => match payload {
                [state] => Ok(PmrCommand::SetPtt {
                    transmit: *state == PTT_TRANSMIT,
                }),
                _ => Err(bad_payload()),
            },
        }
    }
}

impl EncodeCommand for PmrCommand {
    fn encode(&self) -> Vec<u8> {
        // Every payload here is at most a status report, well under the length limit
        write_frame(self.command_type().code(), &self.payload())
    }
}
