//! Client configuration bootstrap.
//!
//! The server address persists in a small TOML file so a session can be
//! re-established without retyping it. Precedence: `--server` flag, then
//! the `SERVER_ADDRESS` environment variable, then the file, then the
//! built-in default.

use log::info;
use serde::{Deserialize, Serialize};
use shared::DEFAULT_SERVER_ADDR;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_PATH: &str = "config/client.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server_address: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads the persisted config, creating it with defaults on first run.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Applies override precedence on top of the persisted value.
    pub fn resolve(file_config: Self, flag: Option<String>) -> Self {
        if let Some(addr) = flag {
            return Self {
                server_address: addr,
            };
        }
        if let Ok(addr) = std::env::var("SERVER_ADDRESS") {
            if !addr.is_empty() {
                return Self {
                    server_address: addr,
                };
            }
        }
        file_config
    }
}
