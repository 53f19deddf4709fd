//! Bifrost Configuration Module
//!
//! Operator settings: where the pipeline documents live, which studio and
//! platform to resolve for, and `${section.key}` template values.
//! Config is stored in `~/.config/bifrost/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`BIFROST_CONFIG_DIR`, `BIFROST_STUDIO`, `BIFROST_PROJECT_ROOT`)
//! 2. Config file (`~/.config/bifrost/config.toml`)
//! 3. Defaults
//!
//! ```toml
//! [pipeline]
//! config_dir = "/studio/pipeline/config"
//! studio = "main_studio"
//! project_root = "/mnt/projects"
//! platform = "posix"
//!
//! [scan]
//! timeout_secs = 120
//!
//! [events]
//! capacity = 10000
//!
//! [template_vars.project]
//! root_path = "/mnt/projects/show_x"
//!
//! [context]
//! USER = "render"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::context::ContextValue;
use crate::error::{BifrostError, Result};
use crate::resolve::Platform;
use crate::template::ConfigVars;
use crate::util::{DEFAULT_EVENT_CAPACITY, DEFAULT_SCAN_TIMEOUT};

/// Env var naming the pipeline documents directory
pub const ENV_CONFIG_DIR: &str = "BIFROST_CONFIG_DIR";
/// Env var naming the studio to resolve for
pub const ENV_STUDIO: &str = "BIFROST_STUDIO";
/// Env var supplying the default `{ROOT}`
pub const ENV_PROJECT_ROOT: &str = "BIFROST_PROJECT_ROOT";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BifrostConfig {
    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub events: EventSettings,

    /// `[template_vars.<section>]` tables, referenced as `${section.key}`
    #[serde(default)]
    pub template_vars: BTreeMap<String, BTreeMap<String, String>>,

    /// Context values applied when a request does not supply them
    #[serde(default)]
    pub context: BTreeMap<String, ContextValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineSettings {
    /// Directory holding `dependencies.yaml`, `folder_mapping.yaml`, `projects/`
    pub config_dir: Option<Utf8PathBuf>,

    /// Studio used when a command does not name one
    pub studio: Option<String>,

    /// Default `{ROOT}`
    pub project_root: Option<String>,

    /// Target platform (`posix` or `windows`); host platform when unset
    pub platform: Option<Platform>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanSettings {
    /// Drift scan timeout in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventSettings {
    /// Events kept in memory before the oldest are evicted
    pub capacity: Option<usize>,
}

impl BifrostConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/bifrost/` on Unix, `%APPDATA%/bifrost/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bifrost")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`
    ///
    /// Returns default config if the file doesn't exist, an error if it
    /// exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BifrostError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| BifrostError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to the default path
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| BifrostError::ConfigError {
                reason: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| BifrostError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(Self::config_path(), content).map_err(|e| BifrostError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Non-empty environment variables take precedence over file values.
    pub fn with_env(mut self) -> Self {
        if let Some(dir) = non_empty_env(ENV_CONFIG_DIR) {
            self.pipeline.config_dir = Some(Utf8PathBuf::from(dir));
        }
        if let Some(studio) = non_empty_env(ENV_STUDIO) {
            self.pipeline.studio = Some(studio);
        }
        if let Some(root) = non_empty_env(ENV_PROJECT_ROOT) {
            self.pipeline.project_root = Some(root);
        }
        self
    }

    /// Pipeline documents directory (`./config` when unset)
    pub fn pipeline_dir(&self) -> Utf8PathBuf {
        self.pipeline
            .config_dir
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from("config"))
    }

    pub fn platform(&self) -> Platform {
        self.pipeline.platform.unwrap_or_default()
    }

    pub fn scan_timeout(&self) -> Duration {
        self.scan
            .timeout_secs
            .map_or(DEFAULT_SCAN_TIMEOUT, Duration::from_secs)
    }

    pub fn event_capacity(&self) -> usize {
        self.events.capacity.unwrap_or(DEFAULT_EVENT_CAPACITY)
    }

    /// Flattened `${section.key}` table
    pub fn config_vars(&self) -> ConfigVars {
        self.template_vars
            .iter()
            .flat_map(|(section, table)| {
                table
                    .iter()
                    .map(move |(key, value)| (format!("{}.{}", section, key), value.clone()))
            })
            .collect()
    }

    /// Context defaults: the `[context]` table plus `ROOT` from `project_root`
    pub fn context_defaults(&self) -> BTreeMap<String, ContextValue> {
        let mut defaults = self.context.clone();
        if let Some(root) = &self.pipeline.project_root {
            defaults.insert("ROOT".to_string(), ContextValue::from(root.as_str()));
        }
        defaults
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
