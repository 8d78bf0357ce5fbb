//! Virtual radio simulation
//!
//! Provides a simulated PMR-171 that applies set commands to its state and
//! answers query-status with a status frame.

use pmr_protocol::{EncodeCommand, Frame, Mode, PmrCommand, StatusReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A simulated PMR-171
#[derive(Debug)]
pub struct VirtualRadio {
    /// Unique identifier for this virtual radio
    id: String,
    /// VFO-A frequency in Hz
    vfo_a_hz: u32,
    /// VFO-B frequency in Hz
    vfo_b_hz: u32,
    /// Current operating mode
    mode: Mode,
    /// PTT active state
    ptt: bool,
    /// When true, status queries go unanswered
    muted: bool,
    /// Number of frames accepted
    frames_received: u64,
}

/// Configuration for creating a virtual radio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualRadioConfig {
    /// Display name/identifier
    pub id: String,
    /// Initial frequency in Hz
    pub initial_frequency_hz: u32,
    /// Initial operating mode
    pub initial_mode: Mode,
}

impl Default for VirtualRadioConfig {
    fn default() -> Self {
        Self {
            id: "Virtual PMR-171".to_string(),
            initial_frequency_hz: 14_250_000, // 20m
            initial_mode: Mode::Usb,
        }
    }
}

impl VirtualRadio {
    /// Create a new virtual radio with default settings
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_config(VirtualRadioConfig {
            id: id.into(),
            ..Default::default()
        })
    }

    /// Create a virtual radio from configuration
    pub fn from_config(config: VirtualRadioConfig) -> Self {
        Self {
            id: config.id,
            vfo_a_hz: config.initial_frequency_hz,
            vfo_b_hz: config.initial_frequency_hz,
            mode: config.initial_mode,
            ptt: false,
            muted: false,
            frames_received: 0,
        }
    }

    /// Get the radio's unique identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the VFO-A frequency in Hz
    pub fn frequency_hz(&self) -> u32 {
        self.vfo_a_hz
    }

    /// Get the VFO-B frequency in Hz
    pub fn vfo_b_hz(&self) -> u32 {
        self.vfo_b_hz
    }

    /// Tune both VFOs, as if from the front panel
    pub fn set_frequency(&mut self, hz: u32) {
        self.vfo_a_hz = hz;
        self.vfo_b_hz = hz;
    }

    /// Get the current operating mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Set the operating mode
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Get the PTT state
    pub fn ptt(&self) -> bool {
        self.ptt
    }

    /// Set the PTT state
    pub fn set_ptt(&mut self, active: bool) {
        self.ptt = active;
    }

    /// Whether status queries are currently ignored
    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Stop (or resume) answering status queries
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Number of frames accepted so far
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Current state as a status report
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            mode: self.mode,
            vfo_a_hz: self.vfo_a_hz,
            vfo_b_hz: self.vfo_b_hz,
        }
    }

    /// Apply a received frame, returning the encoded reply if one is due
    pub fn process_frame(&mut self, frame: &Frame) -> Option<Vec<u8>> {
        let cmd = match PmrCommand::from_frame(frame) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("Virtual radio {} ignoring frame: {}", self.id, e);
                return None;
            }
        };
        self.frames_received += 1;
        debug!("Virtual radio {} processing {:?}", self.id, cmd);

        match cmd {
            PmrCommand::SetFrequency { hz } => {
                self.set_frequency(hz);
                None
            }
            PmrCommand::SetMode { mode } => {
                self.set_mode(mode);
                None
            }
            PmrCommand::SetPtt { transmit } => {
                self.set_ptt(transmit);
                None
            }
            PmrCommand::QueryStatus if self.muted => None,
            PmrCommand::QueryStatus => {
                Some(PmrCommand::StatusReport(self.status_report()).encode())
            }
            // Reports only travel radio → host
            PmrCommand::StatusReport(_) => None,
        }
    }

    /// Format frequency for display
    pub fn frequency_display(&self) -> String {
        let mhz = self.vfo_a_hz as f64 / 1_000_000.0;
        format!("{:.3} MHz", mhz)
    }

    /// Get a summary of current state
    pub fn state_summary(&self) -> String {
        format!(
            "{} - {} {} {}",
            self.id,
            self.frequency_display(),
            self.mode,
            if self.ptt { "[TX]" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmr_protocol::{decode, status};
    use proptest::prelude::*;

    fn frame(cmd: PmrCommand) -> Frame {
        decode(&cmd.encode()).unwrap()
    }

    #[test]
    fn test_create_virtual_radio() {
        let radio = VirtualRadio::new("Test Radio");
        assert_eq!(radio.id(), "Test Radio");
        assert_eq!(radio.frequency_hz(), 14_250_000);
        assert_eq!(radio.mode(), Mode::Usb);
        assert!(!radio.ptt());
        assert_eq!(radio.frames_received(), 0);
    }

    #[test]
    fn test_setters_apply_without_reply() {
        let mut radio = VirtualRadio::new("Test");

        assert!(radio
            .process_frame(&frame(PmrCommand::SetFrequency { hz: 7_074_000 }))
            .is_none());
        assert!(radio
            .process_frame(&frame(PmrCommand::SetMode { mode: Mode::Digi }))
            .is_none());
        assert!(radio
            .process_frame(&frame(PmrCommand::SetPtt { transmit: true }))
            .is_none());

        assert_eq!(radio.frequency_hz(), 7_074_000);
        assert_eq!(radio.vfo_b_hz(), 7_074_000);
        assert_eq!(radio.mode(), Mode::Digi);
        assert!(radio.ptt());
        assert_eq!(radio.frames_received(), 3);
    }

    #[test]
    fn test_query_status_reply() {
        let mut radio = VirtualRadio::from_config(VirtualRadioConfig {
            id: "Test".to_string(),
            initial_frequency_hz: 145_500_000,
            initial_mode: Mode::Nfm,
        });

        let reply = radio.process_frame(&frame(PmrCommand::QueryStatus)).unwrap();
        assert_eq!(status::frequency_from_response(&reply), Ok(145_500_000));
        assert_eq!(status::mode_from_response(&reply), Ok(Mode::Nfm));
    }

    #[test]
    fn test_muted_radio_ignores_queries() {
        let mut radio = VirtualRadio::new("Test");
        radio.set_muted(true);
        assert!(radio.process_frame(&frame(PmrCommand::QueryStatus)).is_none());

        radio.set_muted(false);
        assert!(radio.process_frame(&frame(PmrCommand::QueryStatus)).is_some());
    }

    #[test]
    fn test_invalid_frame_ignored() {
        let mut radio = VirtualRadio::new("Test");
        assert!(radio.process_frame(&Frame::new(0x42, vec![1])).is_none());
        assert!(radio
            .process_frame(&Frame::new(0x09, vec![0, 0, 0, 1, 0, 0, 0, 2]))
            .is_none());
        assert_eq!(radio.frames_received(), 0);
        assert_eq!(radio.frequency_hz(), 14_250_000);
    }

    #[test]
    fn test_state_summary() {
        let mut radio = VirtualRadio::new("Test");
        radio.set_ptt(true);
        assert_eq!(radio.state_summary(), "Test - 14.250 MHz USB [TX]");
    }

    proptest! {
        #[test]
        fn prop_query_reports_last_set(hz in any::<u32>(), id in 0u8..9) {
            let mut radio = VirtualRadio::new("Test");
            let mode = Mode::from_id(id);
            radio.process_frame(&frame(PmrCommand::SetFrequency { hz }));
            radio.process_frame(&frame(PmrCommand::SetMode { mode }));

            let reply = radio.process_frame(&frame(PmrCommand::QueryStatus)).unwrap();
            prop_assert_eq!(status::frequency_from_response(&reply), Ok(hz));
            prop_assert_eq!(status::mode_from_response(&reply), Ok(mode));
        }
    }
}
