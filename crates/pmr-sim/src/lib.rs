//! PMR-171 Simulation Library
//!
//! This crate provides a simulated transceiver for exercising the rigctl
//! bridge without physical hardware:
//!
//! - **VirtualRadio**: tracks frequency/mode/PTT and answers status queries
//!   with protocol-accurate frames
//! - **run_virtual_radio_task**: serves a `VirtualRadio` over any async
//!   byte stream, such as one half of `tokio::io::duplex()`
//!
//! # Example
//!
//! ```rust
//! use pmr_protocol::{decode, EncodeCommand, Mode, PmrCommand};
//! use pmr_sim::VirtualRadio;
//!
//! let mut radio = VirtualRadio::new("PMR-171");
//!
//! let set = decode(&PmrCommand::SetMode { mode: Mode::Am }.encode()).unwrap();
//! assert!(radio.process_frame(&set).is_none());
//!
//! let query = decode(&PmrCommand::QueryStatus.encode()).unwrap();
//! let reply = radio.process_frame(&query).unwrap();
//! assert_eq!(pmr_protocol::status::mode_from_response(&reply), Ok(Mode::Am));
//! ```

pub mod radio;
pub mod radio_task;

pub use radio::{VirtualRadio, VirtualRadioConfig};
pub use radio_task::{
    run_virtual_radio_task, spawn_virtual_radio, VirtualRadioCommand, VirtualRadioHandle,
    VirtualRadioStateEvent,
};
