//! Bridge settings
//!
//! Stored as JSON under `$XDG_CONFIG_HOME/pmr171-rigctld/settings.json`
//! (falling back to `~/.config/pmr171-rigctld/settings.json`). Fields
//! missing from the file take their defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::server::DEFAULT_PORT;

const APP_DIR: &str = "pmr171-rigctld";
const SETTINGS_FILE: &str = "settings.json";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_query_timeout_ms() -> u64 {
    1000
}

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Address the rigctl listener binds to
    #[serde(default = "default_host")]
    pub host: String,
    /// rigctl listener port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Serial device the radio is attached to; prompt if unset
    #[serde(default)]
    pub serial_port: Option<String>,
    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// How long to wait for a query-status response
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            serial_port: None,
            baud_rate: default_baud_rate(),
            query_timeout_ms: default_query_timeout_ms(),
        }
    }
}

impl Settings {
    /// Config directory for the bridge
    ///
    /// Uses `$XDG_CONFIG_HOME` when it is an absolute path, else `~/.config`.
    pub fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join(APP_DIR));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join(APP_DIR))
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join(SETTINGS_FILE))
    }

    /// Load from the default path
    ///
    /// A missing or unreadable file yields defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            debug!("No settings path available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, BridgeError> {
        let json = std::fs::read_to_string(path).map_err(|source| BridgeError::SettingsRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&json).map_err(|source| BridgeError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save to the default path
    pub fn save(&self) -> Result<PathBuf, BridgeError> {
        let path = Self::default_path().ok_or(BridgeError::NoSettingsPath)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), BridgeError> {
        let write_err = |source| BridgeError::SettingsWrite {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(e.into()))?;
        std::fs::write(path, json).map_err(write_err)
    }

    /// `host:port` the listener binds to
    pub fn listen_addr(&self) -> String {
        match self.host.parse::<SocketAddr>() {
            // Already carries a port
            Ok(addr) => addr.to_string(),
            Err(_) if self.host.contains(':') => format!("[{}]:{}", self.host, self.port),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }

    /// Query-status deadline
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
