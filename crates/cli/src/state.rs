use std::fs;
use std::path::{Path, PathBuf};

use common::prelude::{Config, ConfigError};

pub const APP_NAME: &str = "ipfs";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the config root: explicit path (flag or `IPFS_PATH`) or `~/.ipfs`.
pub fn config_root(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
    if let Some(path) = custom_path {
        return Ok(path);
    }

    let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
    Ok(home.join(format!(".{}", APP_NAME)))
}

pub fn config_path(config_root: &Path) -> PathBuf {
    config_root.join(CONFIG_FILE_NAME)
}

/// Load the config of an initialised root.
pub fn load_config(config_root: &Path) -> Result<Config, StateError> {
    let path = config_path(config_root);
    if !path.exists() {
        return Err(StateError::NotInitialized(config_root.to_path_buf()));
    }
    Ok(Config::load(&path)?)
}

/// Load the config if the root is initialised, defaults otherwise.
pub fn load_or_default(config_root: &Path) -> Result<Config, StateError> {
    match load_config(config_root) {
        Err(StateError::NotInitialized(_)) => Ok(Config::default()),
        other => other,
    }
}

/// Paths written by [`init`].
#[derive(Debug, Clone)]
pub struct InitializedRoot {
    pub config_root: PathBuf,
    pub config_path: PathBuf,
    pub blocks_path: PathBuf,
    pub config: Config,
}

/// Initialise a config root with `config`, generating a fresh peer identity.
pub fn init(config_root: &Path, mut config: Config) -> Result<InitializedRoot, StateError> {
    let config_path = config_path(config_root);
    if config_path.exists() {
        return Err(StateError::AlreadyInitialized(config_root.to_path_buf()));
    }

    fs::create_dir_all(config_root)?;

    config.identity.peer_id = uuid::Uuid::new_v4().to_string();

    let blocks_path = config_root.join(&config.datastore.path);
    fs::create_dir_all(&blocks_path)?;

    config.save(&config_path)?;

    Ok(InitializedRoot {
        config_root: config_root.to_path_buf(),
        config_path,
        blocks_path,
        config,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("ipfs not initialized at {0:?}, run 'ipfs init' first")]
    NotInitialized(PathBuf),

    #[error("ipfs configuration file already exists at {0:?}")]
    AlreadyInitialized(PathBuf),

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
