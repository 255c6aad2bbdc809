//! TOML configuration, discovered next to the game executable or passed
//! explicitly through `python_init`.
//!
//! ```toml
//! [python]
//! path = ["datafiles/python"]
//!
//! [log]
//! level = "debug"
//! format = "compact"
//! ```

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{BridgeError, Result};
use crate::logging::LogSettings;

pub const CONFIG_FILE: &str = "pygml.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub python: PythonConfig,

    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PythonConfig {
    /// Extra `sys.path` entries, prepended before every import. Relative
    /// entries resolve against the working directory of the host process.
    #[serde(default)]
    pub path: Vec<String>,
}

impl Config {
    /// Load configuration from a pygml.toml file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BridgeError::Config {
            detail: format!("failed to read {}: {}", path.display(), e),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BridgeError::Config {
            detail: format!("failed to parse config: {}", e),
        })
    }

    /// Find and load a config file from the current directory or parents
    pub fn discover() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(_) => Self::default(),
        }
    }

    /// Walk from `start` up through its parents looking for a config file
    pub fn discover_from(start: &Path) -> Self {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                if let Ok(config) = Self::load(&candidate) {
                    return config;
                }
            }

            current = dir.parent().map(|p| p.to_path_buf());
        }

        Self::default()
    }
}

static GLOBAL: OnceCell<Config> = OnceCell::new();

/// Install the process-wide configuration. Fails once any call has already
/// pinned the discovered defaults.
pub fn init(config: Config) -> Result<()> {
    GLOBAL.set(config).map_err(|_| BridgeError::Config {
        detail: "configuration already initialized".to_string(),
    })
}

pub fn global() -> &'static Config {
    GLOBAL.get_or_init(Config::discover)
}
