use crate::defaults;
use crate::error::VoxcallError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub modem: ModemConfig,
    pub call: CallConfig,
    pub contacts: ContactsConfig,
    pub audio: AudioConfig,
}

/// Serial connection to the SIM800L module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModemConfig {
    pub port: String,
    pub baud: u32,
    pub response_window_ms: u64,
    pub call_window_ms: u64,
}

/// Call behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CallConfig {
    pub country_code: String,
    pub max_call_secs: u64,
}

/// Contact persistence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContactsConfig {
    pub path: PathBuf,
}

/// Loopback audio routing between the cellular audio path and a local device.
///
/// The downlink loopback carries the far end's voice to the local speaker;
/// the uplink loopback carries the local microphone to the cellular path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub downlink_source: String,
    pub downlink_sink: String,
    pub uplink_source: String,
    pub uplink_sink: String,
    pub latency_msec: u32,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            port: defaults::SERIAL_PORT.to_string(),
            baud: defaults::BAUD_RATE,
            response_window_ms: defaults::RESPONSE_WINDOW_MS,
            call_window_ms: defaults::CALL_WINDOW_MS,
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            country_code: defaults::COUNTRY_CODE.to_string(),
            max_call_secs: defaults::CALL_CEILING_SECS,
        }
    }
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::CONTACTS_PATH),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            downlink_source: String::new(),
            downlink_sink: String::new(),
            uplink_source: String::new(),
            uplink_sink: String::new(),
            latency_msec: defaults::LOOPBACK_LATENCY_MS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::Error::new(VoxcallError::ConfigFileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                anyhow::Error::new(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if matches!(
                    e.downcast_ref::<VoxcallError>(),
                    Some(VoxcallError::ConfigFileNotFound { .. })
                ) {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXCALL_PORT → modem.port
    /// - VOXCALL_COUNTRY_CODE → call.country_code
    /// - VOXCALL_CONTACTS → contacts.path
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("VOXCALL_PORT")
            && !port.is_empty()
        {
            self.modem.port = port;
        }

        if let Ok(code) = std::env::var("VOXCALL_COUNTRY_CODE")
            && !code.is_empty()
        {
            self.call.country_code = code;
        }

        if let Ok(path) = std::env::var("VOXCALL_CONTACTS")
            && !path.is_empty()
        {
            self.contacts.path = PathBuf::from(path);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxcall/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxcall")
            .join("config.toml")
    }
}
