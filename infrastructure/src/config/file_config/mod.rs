//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Top-level keys describe the backend and the last used case; tuning
//! lives under `[analysis]`.

mod analysis;

pub use analysis::FileAnalysisConfig;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use themis_domain::{DEFAULT_MODEL, Model};
use thiserror::Error;

pub const DEFAULT_OLLAMA_HOST: &str = "localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("model name cannot be empty")]
    EmptyModelName,

    #[error("ollama_host cannot be empty")]
    EmptyHost,

    #[error("ollama_port cannot be 0")]
    InvalidPort,

    #[error("analysis.request_timeout_secs cannot be 0")]
    InvalidTimeout,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model used by single-model commands
    pub model: String,
    pub ollama_host: String,
    pub ollama_port: u16,
    /// Markdown file with numbered questions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions_file: Option<PathBuf>,
    /// Case directory of the last single-model command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_case_dir: Option<PathBuf>,
    pub analysis: FileAnalysisConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            ollama_port: DEFAULT_OLLAMA_PORT,
            questions_file: None,
            last_case_dir: None,
            analysis: FileAnalysisConfig::default(),
        }
    }
}

impl FileConfig {
    pub fn model(&self) -> Model {
        Model::new(self.model.trim())
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if self.ollama_host.trim().is_empty() {
            return Err(ConfigValidationError::EmptyHost);
        }
        if self.ollama_port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }
        if self.analysis.request_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        Ok(())
    }

    /// Render as TOML, as written by `config --reset`
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
model = "llama3"
ollama_host = "gpu-box"
ollama_port = 8080
questions_file = "questions.md"
last_case_dir = "/cases/doe"

[analysis]
document_char_budget = 8000
request_timeout_secs = 60
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model(), Model::new("llama3"));
        assert_eq!(config.ollama_host, "gpu-box");
        assert_eq!(config.ollama_port, 8080);
        assert_eq!(config.questions_file, Some(PathBuf::from("questions.md")));
        assert_eq!(config.last_case_dir, Some(PathBuf::from("/cases/doe")));
        assert_eq!(config.analysis.document_char_budget, 8000);
        assert_eq!(config.analysis.request_timeout_secs, 60);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: FileConfig = toml::from_str("ollama_port = 9999\n").unwrap();
        assert_eq!(config.ollama_port, 9999);
        // Defaults should apply
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.ollama_host, DEFAULT_OLLAMA_HOST);
        assert!(config.questions_file.is_none());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = FileConfig::default();
        let text = config.to_toml().unwrap();

        assert!(!text.contains("last_case_dir"));
        assert_eq!(toml::from_str::<FileConfig>(&text).unwrap(), config);
    }

    #[test]
    fn test_validate() {
        assert_eq!(FileConfig::default().validate(), Ok(()));

        let config = FileConfig {
            model: "  ".into(),
            ..FileConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyModelName));

        let config = FileConfig {
            ollama_port: 0,
            ..FileConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidPort));
    }
}
