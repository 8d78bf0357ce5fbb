//! Serial Port Detection Library
//!
//! This crate enumerates serial ports and lets an operator pick the one the
//! PMR-171 is attached to.
//!
//! # Example
//!
//! ```rust,no_run
//! use pmr_detect::PortScanner;
//!
//! let scanner = PortScanner::new();
//! let ports = scanner.enumerate_ports().unwrap();
//!
//! for port in ports {
//!     println!("Found port: {}", port.describe());
//! }
//! ```

pub mod error;
pub mod scanner;
pub mod select;

pub use error::DetectError;
pub use scanner::{PortScanner, ScannerConfig, SerialPortInfo};
pub use select::{parse_selection, prompt_for_port};
