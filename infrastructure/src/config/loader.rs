//! Configuration file loader with multi-source merging

use super::file_config::{ConfigValidationError, FileConfig};
use crate::storage::write_atomic;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const APP_DIR: &str = "themis";
const PROJECT_FILE: &str = "themis.toml";
const ENV_PREFIX: &str = "THEMIS_";

/// Errors while loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Parse(#[from] Box<figment::Error>),

    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Could not determine the user config directory")]
    NoConfigDir,

    #[error("Could not write config {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `THEMIS_*` environment variables (`THEMIS_ANALYSIS__MAX_ATTEMPTS` for nested keys)
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./themis.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/themis/config.toml`
    /// 5. Default values
    ///
    /// Command-line flags are applied on top by the caller.
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        Self::load_from(
            Self::global_config_path().as_deref(),
            Self::project_config_path().as_deref(),
            config_path,
        )
    }

    /// Merge the given files (any may be absent) over the defaults
    pub fn load_from(
        global: Option<&Path>,
        project: Option<&Path>,
        explicit: Option<&Path>,
    ) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [global, project].into_iter().flatten() {
            if path.exists() {
                debug!("Merging config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: FileConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with the global file only.
    ///
    /// This is the base for remembering last-used settings, so project and
    /// environment overrides are never copied into the global file.
    pub fn load_global() -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));
        if let Some(path) = Self::global_config_path()
            && path.exists()
        {
            figment = figment.merge(Toml::file(path));
        }
        figment.extract().map_err(|e| ConfigError::Parse(Box::new(e)))
    }

    /// Write `config` to `path` as TOML
    pub fn save(config: &FileConfig, path: &Path) -> Result<(), ConfigError> {
        let write_error = |message: String| ConfigError::Write {
            path: path.to_path_buf(),
            message,
        };
        let text = config.to_toml().map_err(|e| write_error(e.to_string()))?;
        write_atomic(path, text.as_bytes()).map_err(|e| write_error(e.to_string()))
    }

    pub fn save_global(config: &FileConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path().ok_or(ConfigError::NoConfigDir)?;
        Self::save(config, &path)?;
        Ok(path)
    }

    /// Overwrite the global file with the defaults
    pub fn reset() -> Result<PathBuf, ConfigError> {
        Self::save_global(&FileConfig::default())
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/themis/config.toml if set,
    /// otherwise falls back to ~/.config/themis/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        let path = PathBuf::from(PROJECT_FILE);
        path.exists().then_some(path)
    }

    /// Print the config file locations being used (for debugging)
    pub fn print_config_sources(explicit: Option<&Path>) {
        println!("Configuration sources (in priority order):");

        println!("  [ENV  ] Environment: {}*", ENV_PREFIX);

        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Explicit: {}", mark, path.display());
        }

        if let Some(path) = Self::project_config_path() {
            println!("  [FOUND] Project: {}", path.display());
        } else {
            println!("  [     ] Project: ./{}", PROJECT_FILE);
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            println!("  [{}] Global:  {}", mark, path.display());
        }

        println!("  [     ] Default: built-in defaults");
    }
}
