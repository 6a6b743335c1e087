use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::buffer::ADDRESS_SIZE;
use crate::error::{Error, Result};
use crate::protocol::pk_read::REQUEST_HEADER_SIZE;

/// Gateway configuration.
///
/// Loaded from a JSON file whose path is the first command-line argument;
/// every section and field is optional and falls back to its default.
///
/// ```json
/// { "rest":   { "ip": "0.0.0.0", "port": 8080, "api_version": "1.0.0",
///               "buffer_size_bytes": 4096, "pre_alloc_buffers": 32 },
///   "engine": { "host": "localhost", "port": 1186 },
///   "log":    { "level": "info", "file": "" } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rest: RestConfig,
    pub engine: EngineConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    pub ip: String,
    pub port: u16,
    pub api_version: String,
    pub buffer_size_bytes: usize,
    pub pre_alloc_buffers: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub file: String,
    /// Rotation knobs are recorded for the operator's log shipper; the
    /// gateway itself appends to `file` without rotating.
    pub max_size_mb: u32,
    pub max_backups: u32,
    pub max_age_days: u32,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".to_string(),
            port: 8080,
            api_version: "1.0.0".to_string(),
            buffer_size_bytes: 4096,
            pre_alloc_buffers: 32,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1186,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: String::new(),
            max_size_mb: 100,
            max_backups: 10,
            max_age_days: 30,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file. `None` yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|e| {
                    Error::BadConfig(format!("cannot read {}: {e}", path.display()))
                })?;
                serde_json::from_str(&raw).map_err(|e| {
                    Error::BadConfig(format!("cannot parse {}: {e}", path.display()))
                })?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject buffer geometries the codec cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.rest.buffer_size_bytes % ADDRESS_SIZE != 0 {
            return Err(Error::BadConfig(format!(
                "rest.buffer_size_bytes must be a multiple of {ADDRESS_SIZE}"
            )));
        }
        if self.rest.buffer_size_bytes < REQUEST_HEADER_SIZE as usize {
            return Err(Error::BadConfig(format!(
                "rest.buffer_size_bytes must be at least {REQUEST_HEADER_SIZE}"
            )));
        }
        if self.rest.api_version.is_empty() {
            return Err(Error::BadConfig("rest.api_version must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.rest.ip, self.rest.port)
    }
}

impl EngineConfig {
    /// Connection string handed to the engine's `init`.
    pub fn connection_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
