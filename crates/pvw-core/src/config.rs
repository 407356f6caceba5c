//! Configuration file loading.
//!
//! Resolution order for the file (first hit wins):
//! 1. Explicit `--config` path
//! 2. `PVW_CONFIG` environment variable
//! 3. `$XDG_CONFIG_HOME/pvw/config.toml` (or `~/.config/pvw/config.toml`)
//! 4. Built-in defaults
//!
//! An explicitly named file must exist; the XDG file is optional. CLI flags
//! are layered over the result by the binary.
//!
//! ```toml
//! [filter]
//! names = ["nginx"]
//! ports = ["80", "443"]
//! listen_only = true
//!
//! [view]
//! read_only = true
//! refresh_interval_secs = 5
//!
//! [view.columns]
//! owner = true
//! ```

use pvw_common::{ColumnToggles, FilterConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "pvw";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PVW_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for pvw_common::Error {
    fn from(err: ConfigError) -> Self {
        pvw_common::Error::Config(err.to_string())
    }
}

/// Presentation and runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub columns: ColumnToggles,
    pub read_only: bool,
    /// Auto-refresh period; unset means manual refresh only.
    pub refresh_interval_secs: Option<u64>,
    /// Kill an lsof invocation after this long; unset means wait forever.
    pub tool_timeout_secs: Option<u64>,
    /// lsof binary to run instead of the one on PATH.
    pub lsof_path: Option<PathBuf>,
}

/// Contents of a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub filter: FilterConfig,
    pub view: ViewConfig,
}

impl AppConfig {
    /// Parse and validate TOML text.
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view.refresh_interval_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "view.refresh_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.view.tool_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "view.tool_timeout_secs must be at least 1".to_string(),
            ));
        }
        // Ports compare as lsof prints them, so `*` and service names pass.
        if self.filter.ports.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "filter.ports entries must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loaded configuration and where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// `None` when running on defaults.
    pub path: Option<PathBuf>,
}

/// Load configuration with the standard resolution order.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    load_from(explicit, env_path.as_deref(), default_config_dir().as_deref())
}

/// Resolution with every source passed in.
pub fn load_from(
    explicit: Option<&Path>,
    env_path: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig, ConfigError> {
    if let Some(path) = explicit.or(env_path) {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        return read_file(path);
    }

    if let Some(dir) = config_dir {
        let path = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if path.exists() {
            return read_file(&path);
        }
    }

    tracing::debug!(target: "pvw.config", "no config file, using defaults");
    Ok(LoadedConfig::default())
}

fn read_file(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = AppConfig::from_toml(&text, path)?;
    tracing::debug!(target: "pvw.config", path = %path.display(), "loaded config file");
    Ok(LoadedConfig {
        config,
        path: Some(path.to_path_buf()),
    })
}

/// Base config directory: `$XDG_CONFIG_HOME`, else `~/.config`.
fn default_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
}
