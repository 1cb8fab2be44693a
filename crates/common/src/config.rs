use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_ADDRESS: &str = "/ip4/127.0.0.1/tcp/5001";
pub const DEFAULT_GATEWAY_ADDRESS: &str = "/ip4/127.0.0.1/tcp/8080";
pub const DEFAULT_DATASTORE_PATH: &str = "blocks";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub identity: Identity,
    #[serde(default)]
    pub addresses: Addresses,
    #[serde(default)]
    pub datastore: Datastore,
    #[serde(default)]
    pub migration: Migration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Peer identifier of the node owning this config root
    #[serde(default)]
    pub peer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addresses {
    /// Multiaddr the daemon API listens on
    #[serde(default = "default_api_address")]
    pub api: String,
    /// Multiaddr the daemon gateway listens on
    #[serde(default = "default_gateway_address")]
    pub gateway: String,
}

fn default_api_address() -> String {
    DEFAULT_API_ADDRESS.to_string()
}

fn default_gateway_address() -> String {
    DEFAULT_GATEWAY_ADDRESS.to_string()
}

impl Default for Addresses {
    fn default() -> Self {
        Self {
            api: default_api_address(),
            gateway: default_gateway_address(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datastore {
    /// Block store directory, relative paths resolve against the config root
    #[serde(default = "default_datastore_path")]
    pub path: String,
}

fn default_datastore_path() -> String {
    DEFAULT_DATASTORE_PATH.to_string()
}

impl Default for Datastore {
    fn default() -> Self {
        Self {
            path: default_datastore_path(),
        }
    }
}

/// Settings for pulling migration payloads from a distribution site.
///
/// Empty values fall back to the fetcher defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// 0 selects the default ceiling, -1 disables it
    #[serde(default)]
    pub fetch_limit: i64,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
