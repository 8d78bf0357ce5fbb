//! Serial port enumeration
//!
//! Lists the serial ports the OS knows about, drops ones that cannot be a
//! radio link (Bluetooth, debug consoles) and orders the rest so USB serial
//! bridges come first.

use serde::Serialize;
use serialport::{available_ports, SerialPortType};
use tracing::{debug, info};

use crate::error::DetectError;

/// USB vendor ids of common USB-UART bridge chips
const USB_UART_VENDORS: &[(u16, &str)] = &[
    (0x10C4, "Silicon Labs"),
    (0x1A86, "WCH"),
    (0x0403, "FTDI"),
    (0x067B, "Prolific"),
];

/// One enumerated serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerialPortInfo {
    /// Device name as passed to open (e.g. /dev/ttyUSB0, COM3)
    pub port: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl SerialPortInfo {
    fn new(port: String, port_type: &SerialPortType) -> Self {
        let usb = match port_type {
            SerialPortType::UsbPort(usb) => Some(usb),
            _ => None,
        };

        Self {
            port,
            vid: usb.map(|u| u.vid),
            pid: usb.map(|u| u.pid),
            serial_number: usb.and_then(|u| u.serial_number.clone()),
            manufacturer: usb.and_then(|u| u.manufacturer.clone()),
            product: usb.and_then(|u| u.product.clone()),
        }
    }

    /// Whether the port sits behind a known USB-UART bridge
    pub fn is_usb_uart(&self) -> bool {
        self.vid
            .is_some_and(|vid| USB_UART_VENDORS.iter().any(|(v, _)| *v == vid))
    }

    /// One-line description for listings, e.g. `/dev/ttyUSB0 - CP2102 (10C4:EA60)`
    pub fn describe(&self) -> String {
        let vendor = self.vid.and_then(|vid| {
            USB_UART_VENDORS
                .iter()
                .find(|(v, _)| *v == vid)
                .map(|(_, name)| *name)
        });
        let label = self
            .product
            .as_deref()
            .or(self.manufacturer.as_deref())
            .or(vendor)
            .unwrap_or("Unknown");

        match self.vid.zip(self.pid) {
            Some((vid, pid)) => format!("{} - {} ({:04X}:{:04X})", self.port, label, vid, pid),
            None => format!("{} - {}", self.port, label),
        }
    }
}

/// Which ports the scanner leaves out
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Skip ports whose name contains any of these
    pub skip_patterns: Vec<String>,
    /// Skip ports the OS reports as Bluetooth
    pub skip_bluetooth: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            // macOS exposes the debug console and Bluetooth as tty devices
            skip_patterns: vec!["Bluetooth".to_string(), "debug".to_string()],
            skip_bluetooth: true,
        }
    }
}

/// Serial port scanner
#[derive(Debug, Clone, Default)]
pub struct PortScanner {
    config: ScannerConfig,
}

impl PortScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// List candidate ports, USB-UART bridges first
    pub fn enumerate_ports(&self) -> Result<Vec<SerialPortInfo>, DetectError> {
        let ports = available_ports()?;

        let listed = ports
            .into_iter()
            .filter(|p| !self.skips_type(&p.port_type))
            .map(|p| SerialPortInfo::new(p.port_name, &p.port_type))
            .collect();
        let ports = self.select(listed);

        info!("Found {} candidate serial port(s)", ports.len());
        for port in &ports {
            debug!("  {}", port.describe());
        }
        Ok(ports)
    }

    fn skips_type(&self, port_type: &SerialPortType) -> bool {
        self.config.skip_bluetooth && matches!(port_type, SerialPortType::BluetoothPort)
    }

    fn skips_name(&self, port: &SerialPortInfo) -> bool {
        self.config
            .skip_patterns
            .iter()
            .any(|pattern| port.port.contains(pattern.as_str()))
    }

    /// Filter by name and sort: USB-UART bridges, then other USB, then by name
    fn select(&self, ports: Vec<SerialPortInfo>) -> Vec<SerialPortInfo> {
        let mut ports: Vec<_> = ports.into_iter().filter(|p| !self.skips_name(p)).collect();
        ports.sort_by(|a, b| {
            (!a.is_usb_uart(), a.vid.is_none(), &a.port).cmp(&(
                !b.is_usb_uart(),
                b.vid.is_none(),
                &b.port,
            ))
        });
        ports
    }
}
