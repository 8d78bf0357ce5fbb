//! Operating mode table
//!
//! The radio identifies modes by a numeric id on the wire; rigctl clients
//! use the canonical names. Both directions fall back to USB.

use std::fmt;

/// Operating modes supported by the PMR-171
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Mode {
    /// Upper Sideband
    #[default]
    Usb = 0,
    /// Lower Sideband
    Lsb = 1,
    /// CW Reverse
    Cwr = 2,
    /// CW Lower
    Cwl = 3,
    /// Amplitude Modulation
    Am = 4,
    /// Wide FM
    Wfm = 5,
    /// Narrow FM
    Nfm = 6,
    /// Digital
    Digi = 7,
    /// Packet
    Pkt = 8,
}

impl Mode {
    /// All modes in id order
    pub const ALL: [Mode; 9] = [
        Mode::Usb,
        Mode::Lsb,
        Mode::Cwr,
        Mode::Cwl,
        Mode::Am,
        Mode::Wfm,
        Mode::Nfm,
        Mode::Digi,
        Mode::Pkt,
    ];

    /// Wire id of this mode
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Canonical name as reported to rigctl clients
    pub fn name(self) -> &'static str {
        match self {
            Mode::Usb => "USB",
            Mode::Lsb => "LSB",
            Mode::Cwr => "CWR",
            Mode::Cwl => "CWL",
            Mode::Am => "AM",
            Mode::Wfm => "WFM",
            Mode::Nfm => "NFM",
            Mode::Digi => "DIGI",
            Mode::Pkt => "PKT",
        }
    }

    /// Look up a mode by wire id
    pub fn try_from_id(id: u8) -> Option<Mode> {
        Self::ALL.get(id as usize).copied()
    }

    /// Look up a mode by name, ignoring ASCII case
    pub fn try_from_name(name: &str) -> Option<Mode> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// Look up a mode by wire id, falling back to USB
    pub fn from_id(id: u8) -> Mode {
        Self::try_from_id(id).unwrap_or_default()
    }

    /// Look up a mode by name, falling back to USB
    pub fn from_name(name: &str) -> Mode {
        Self::try_from_name(name).unwrap_or_default()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
