//! Configuration file loading for themis
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `THEMIS_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./themis.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/themis/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_PORT, FileAnalysisConfig,
    FileConfig,
};
pub use loader::{ConfigError, ConfigLoader};
