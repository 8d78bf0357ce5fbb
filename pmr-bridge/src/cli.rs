//! Command line interface

use std::path::PathBuf;

use clap::Parser;

use crate::settings::Settings;

/// rigctl-compatible TCP bridge for the PMR-171 transceiver
#[derive(Debug, Default, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to listen on for rigctl clients
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Serial device the radio is attached to (prompted for if unset)
    #[arg(short, long, value_name = "PORT")]
    pub serial: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Milliseconds to wait for the radio to answer a query
    #[arg(long, value_name = "MS")]
    pub query_timeout_ms: Option<u64>,

    /// Settings file to use instead of the default location
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    pub save_config: bool,

    /// List detected serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Serve a simulated radio instead of a serial device
    #[arg(long)]
    pub simulate: bool,
}

impl Cli {
    /// Override `settings` with every flag that was given
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(serial) = &self.serial {
            settings.serial_port = Some(serial.clone());
        }
        if let Some(baud) = self.baud {
            settings.baud_rate = baud;
        }
        if let Some(ms) = self.query_timeout_ms {
            settings.query_timeout_ms = ms;
        }
    }
}
