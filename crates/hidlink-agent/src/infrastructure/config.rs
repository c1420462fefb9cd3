//! TOML-based configuration for the agent.
//!
//! The agent reads `AgentConfig` from the path given with `--config`, or else
//! from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\hidlink\config.toml`
//! - Linux:    `~/.config/hidlink/config.toml` (or `$XDG_CONFIG_HOME/hidlink/`)
//! - macOS:    `~/Library/Application Support/hidlink/config.toml`
//!
//! Every field has a default, so an absent platform file (or an empty one)
//! yields a working configuration:
//!
//! ```toml
//! log_level = "info"
//!
//! [dispatch]
//! settle_ms = 5
//! # max_hold_ms = 10000   # optional cap on combo holds; unset means no cap
//!
//! [tcp]
//! enabled = true
//! bind_address = "0.0.0.0:7070"
//! protocol = "line"
//!
//! [http]
//! enabled = true
//! bind_address = "0.0.0.0:8080"
//!
//! [serial]
//! enabled = false
//! device = "/dev/ttyACM0"
//! baud = 115200
//! protocol = "line"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::dispatch::DispatchSettings;
use crate::infrastructure::transport::WireProtocol;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AgentConfig {
    /// `tracing` filter used when `RUST_LOG` is unset, e.g. `"info"` or
    /// `"hidlink=debug"`.
    pub log_level: String,
    pub dispatch: DispatchConfig,
    pub tcp: TcpConfig,
    pub http: HttpConfig,
    pub serial: SerialConfig,
}

/// Combo timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Pause between pressing and auto-releasing a combo.
    pub settle_ms: u64,
    /// Optional upper bound on a requested combo hold.  Unset runs every
    /// hold to completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hold_ms: Option<u64>,
}

/// TCP byte-stream transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TcpConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub protocol: WireProtocol,
}

/// HTTP query-parameter transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub bind_address: String,
}

/// Serial-line transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SerialConfig {
    pub enabled: bool,
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`.
    pub device: String,
    pub baud: u32,
    pub protocol: WireProtocol,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            dispatch: DispatchConfig::default(),
            tcp: TcpConfig::default(),
            http: HttpConfig::default(),
            serial: SerialConfig::default(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        let settings = DispatchSettings::default();
        Self {
            settle_ms: settings.settle.as_millis() as u64,
            max_hold_ms: settings.max_hold.map(|d| d.as_millis() as u64),
        }
    }
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:7070".to_string(),
            protocol: WireProtocol::Line,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device: default_serial_device().to_string(),
            baud: 115_200,
            protocol: WireProtocol::Line,
        }
    }
}

fn default_serial_device() -> &'static str {
    if cfg!(target_os = "windows") {
        "COM3"
    } else {
        "/dev/ttyACM0"
    }
}

impl DispatchConfig {
    /// Converts the millisecond fields into [`DispatchSettings`].
    pub fn settings(&self) -> DispatchSettings {
        DispatchSettings {
            settle: Duration::from_millis(self.settle_ms),
            max_hold: self.max_hold_ms.map(Duration::from_millis),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration.
///
/// With `explicit` set, that file must exist.  Otherwise the platform file is
/// read, and a missing file (or an undeterminable config directory) yields
/// [`AgentConfig::default()`].
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(explicit: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        return parse_config(&content);
    }

    let Ok(path) = config_file_path() else {
        return Ok(AgentConfig::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AgentConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Parses TOML text into an [`AgentConfig`], defaulting absent fields.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<AgentConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Renders `config` as TOML.
///
/// # Errors
///
/// Returns [`ConfigError::Serialize`] if serialization fails.
pub fn render_config(config: &AgentConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Resolves the platform config directory including the `hidlink` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("hidlink"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("hidlink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("hidlink")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
