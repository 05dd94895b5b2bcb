// ⚙️ Config - Key bindings and presentation settings
//
// Stored as JSON. Every field has a default, so a partial or missing file
// still yields a usable config.

use crate::holdings::OwnerId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_SAVE_KEY: &str = "production-stats";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write config to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// KEY BINDINGS
// ============================================================================

/// One or more key names that trigger an action, e.g. `["F5"]` or
/// `["Down", "J"]`. Names compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBinding(pub Vec<String>);

impl KeyBinding {
    pub fn single(key: &str) -> Self {
        KeyBinding(vec![key.to_string()])
    }

    pub fn matches(&self, key_name: &str) -> bool {
        self.0.iter().any(|k| k.eq_ignore_ascii_case(key_name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub toggle_menu: KeyBinding,
    pub sort: KeyBinding,
    pub focus_search: KeyBinding,
    pub scroll_up: KeyBinding,
    pub scroll_down: KeyBinding,
    pub page_up: KeyBinding,
    pub page_down: KeyBinding,
    pub next_page: KeyBinding,
    pub previous_page: KeyBinding,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        ControlsConfig {
            toggle_menu: KeyBinding::single("F5"),
            sort: KeyBinding::single("S"),
            focus_search: KeyBinding::single("/"),
            scroll_up: KeyBinding::single("Up"),
            scroll_down: KeyBinding::single("Down"),
            page_up: KeyBinding::single("PageUp"),
            page_down: KeyBinding::single("PageDown"),
            next_page: KeyBinding::single("Right"),
            previous_page: KeyBinding::single("Left"),
        }
    }
}

// ============================================================================
// STATS CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub controls: ControlsConfig,
    /// Default scroll step (rows in the terminal menu)
    pub scroll_amount: u32,
    /// Save-data key the tracker is stored under
    pub save_key: String,
    /// The local player; other players' changes are not tracked
    pub owner_id: OwnerId,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            controls: ControlsConfig::default(),
            scroll_amount: 3,
            save_key: DEFAULT_SAVE_KEY.to_string(),
            owner_id: 1,
        }
    }
}

impl StatsConfig {
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Read `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "config.defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&contents)?;
        info!(path = %path.display(), save_key = %config.save_key, "config.loaded");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a broken file is logged and replaced
    /// by the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config.load_failed");
                Self::default()
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save-data key holding the current in-game date.
    pub fn date_key(&self) -> String {
        format!("{}/date", self.save_key)
    }
}

// ============================================================================
// TESTS
// ============================================================================
