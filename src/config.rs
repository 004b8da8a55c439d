//! Bridge Configuration
//!
//! Handles parsing of gmt-clib.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ffi::LibraryLoader;

/// Name of the configuration file searched for by `find_and_load`.
pub const CONFIG_FILE: &str = "gmt-clib.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching gmt-clib.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// Where to find libgmt
    #[serde(default)]
    pub library: LibraryConfig,

    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,
}

impl BridgeConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: BridgeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Build a library loader from the `[library]` section.
    pub fn loader(&self) -> LibraryLoader {
        let mut loader = LibraryLoader::new();
        if let Some(path) = &self.library.path {
            loader = loader.with_hint(path);
        }
        for dir in &self.library.search_paths {
            loader.add_search_path(dir);
        }
        loader
    }
}

/// Library location settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Explicit path to the shared library, tried first
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Extra directories searched for the platform library names
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

/// Session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session tag passed to GMT_Create_Session
    #[serde(default = "default_session_name")]
    pub name: String,

    /// Grid padding; `None` uses the library's GMT_PAD_DEFAULT
    #[serde(default)]
    pub pad: Option<u32>,

    /// Oldest library version accepted
    #[serde(default = "default_required_version")]
    pub required_version: String,
}

fn default_session_name() -> String {
    "gmt-clib-session".to_string()
}

fn default_required_version() -> String {
    "6.4.0".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: default_session_name(),
            pad: None,
            required_version: default_required_version(),
        }
    }
}
