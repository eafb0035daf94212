//! Configuration
//!
//! Optional TOML settings file covering what used to be ambient globals:
//! the default interface and the logging setup. Resolution order:
//! explicit --config path, then $ARPCTL_CONFIG, then /etc/arpctl.toml,
//! then built-in defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Interface assumed when neither -i nor the settings file names one.
pub const DEFAULT_INTERFACE: &str = "eth0";

/// System-wide settings file location.
pub const SYSTEM_CONFIG: &str = "/etc/arpctl.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Interface that owns entries when -i is not given.
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default)]
    pub log: LogSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            log: LogSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_level")]
    pub level: String,
    /// Output format: pretty, compact, json
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_interface() -> String {
    DEFAULT_INTERFACE.to_string()
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

/// Load settings from a TOML file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let config: Config = toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
    Ok(config)
}

/// Locate and load settings, falling back to built-in defaults when no
/// file exists. An explicitly named file must exist and parse.
pub fn load_default(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load(path);
    }
    if let Ok(path) = std::env::var("ARPCTL_CONFIG") {
        return load(path);
    }
    let system = Path::new(SYSTEM_CONFIG);
    if system.exists() {
        return load(system);
    }
    Ok(Config::default())
}
