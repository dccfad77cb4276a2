//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// CLI arguments for themis
#[derive(Parser, Debug)]
#[command(name = "themis")]
#[command(author, version, about = "Legal case analysis and defense preparation with local LLMs")]
#[command(long_about = r#"
Themis reads the PDFs of a case directory, asks a local Ollama model a
list of questions about each one, and turns the answers into defense
materials.

The pipeline has three stages:
1. Analysis: every PDF is asked every question (answers are cached)
2. Defense: strategy, action items and a timeline are drafted
3. Report: everything is combined into one markdown report

Configuration files are loaded from (in priority order):
1. THEMIS_* environment variables
2. --config <path>     Explicit config file
3. ./themis.toml       Project-level config
4. ~/.config/themis/config.toml   Global config

Example:
  themis analyze mistral --dir ./cases/doe --questions questions.md
  themis full-process --case-dir ./cases/doe
  themis all-models --case-dir ./cases/doe --models mistral,llama3
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Default model when a command does not name one
    #[arg(long = "model", global = true, value_name = "MODEL")]
    pub default_model: Option<String>,

    /// Ollama host name or URL
    #[arg(long, global = true, value_name = "HOST")]
    pub ollama_host: Option<String>,

    /// Ollama port
    #[arg(long, global = true, value_name = "PORT")]
    pub ollama_port: Option<u16>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask every question about every PDF of a directory
    Analyze {
        /// Model to use
        model: Option<String>,

        /// Directory containing the PDFs
        #[arg(short, long, value_name = "DIR")]
        dir: PathBuf,

        /// Markdown file with numbered questions
        #[arg(long, value_name = "FILE")]
        questions: Option<PathBuf>,
    },

    /// Draft defense materials from an existing analysis
    Defend {
        /// Model to use
        model: Option<String>,

        /// Case directory
        #[arg(short, long, value_name = "DIR")]
        case_dir: PathBuf,

        /// Analysis JSON to use instead of the newest one for this model
        #[arg(long, value_name = "FILE")]
        analysis: Option<PathBuf>,
    },

    /// Analyze, draft the defense and write the combined report
    FullProcess {
        /// Model to use
        model: Option<String>,

        /// Case directory
        #[arg(short, long, value_name = "DIR")]
        case_dir: PathBuf,

        /// Markdown file with numbered questions
        #[arg(long, value_name = "FILE")]
        questions: Option<PathBuf>,
    },

    /// Run the full process with several models and compare them
    AllModels {
        /// Case directory
        #[arg(short, long, value_name = "DIR")]
        case_dir: PathBuf,

        /// Models to run (default: every model the backend lists)
        #[arg(long, value_name = "MODELS", value_delimiter = ',')]
        models: Vec<String>,

        /// Markdown file with numbered questions
        #[arg(long, value_name = "FILE")]
        questions: Option<PathBuf>,
    },

    /// Show or reset the configuration
    Config {
        /// Print the merged configuration and its sources
        #[arg(long, conflicts_with = "reset")]
        show: bool,

        /// Write the default configuration to the global config file
        #[arg(long)]
        reset: bool,
    },

    /// Delete cached answers of a case directory
    ClearCache {
        /// Model whose cache to delete
        model: Option<String>,

        /// Case directory
        #[arg(short, long, value_name = "DIR")]
        case_dir: PathBuf,

        /// Delete the cache of every model
        #[arg(long, conflicts_with = "model")]
        all: bool,
    },
}

impl Command {
    /// Case directory the command works on, if any
    pub fn case_dir(&self) -> Option<&Path> {
        match self {
            Self::Analyze { dir, .. } => Some(dir),
            Self::Defend { case_dir, .. }
            | Self::FullProcess { case_dir, .. }
            | Self::AllModels { case_dir, .. }
            | Self::ClearCache { case_dir, .. } => Some(case_dir),
            Self::Config { .. } => None,
        }
    }

    /// Model named positionally on the command line
    pub fn model(&self) -> Option<&str> {
        match self {
            Self::Analyze { model, .. }
            | Self::Defend { model, .. }
            | Self::FullProcess { model, .. }
            | Self::ClearCache { model, .. } => model.as_deref(),
            Self::AllModels { .. } | Self::Config { .. } => None,
        }
    }

    /// Whether the command runs against a single model and should check
    /// the backend and remember its settings
    pub fn is_single_model(&self) -> bool {
        matches!(
            self,
            Self::Analyze { .. } | Self::Defend { .. } | Self::FullProcess { .. }
        )
    }
}

impl Cli {
    /// Positional model, then `--model`, then `fallback` (from config)
    pub fn resolve_model(&self, fallback: &str) -> String {
        self.command
            .model()
            .or(self.default_model.as_deref())
            .unwrap_or(fallback)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_with_positional_model() {
        let cli = parse(&["themis", "analyze", "llama3", "--dir", "cases/doe"]);

        assert_eq!(cli.resolve_model("mistral"), "llama3");
        assert_eq!(cli.command.case_dir(), Some(Path::new("cases/doe")));
        assert!(cli.command.is_single_model());
    }

    #[test]
    fn test_model_precedence() {
        let cli = parse(&["themis", "--model", "qwen2", "defend", "--case-dir", "d"]);
        assert_eq!(cli.resolve_model("mistral"), "qwen2");

        let cli = parse(&["themis", "defend", "--case-dir", "d"]);
        assert_eq!(cli.resolve_model("mistral"), "mistral");
    }

    #[test]
    fn test_all_models_list() {
        let cli = parse(&[
            "themis",
            "all-models",
            "--case-dir",
            "d",
            "--models",
            "mistral,llama3:8b",
            "-vv",
        ]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::AllModels { models, .. } => assert_eq!(models, vec!["mistral", "llama3:8b"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_clear_cache_all_conflicts_with_model() {
        assert!(
            Cli::try_parse_from(["themis", "clear-cache", "m1", "--case-dir", "d", "--all"])
                .is_err()
        );
    }

    #[test]
    fn test_config_show_and_reset_conflict() {
        assert!(Cli::try_parse_from(["themis", "config", "--show", "--reset"]).is_err());
    }
}
