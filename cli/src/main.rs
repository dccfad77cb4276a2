//! CLI entrypoint for themis
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use themis_application::{
    ClearCacheUseCase, DefendInput, FullProcessInput, LlmGateway, NoProgress, PipelineError,
    PipelineOutput, PipelineParams, PipelinePorts, ProgressNotifier, RunAllModelsInput,
    RunAllModelsUseCase, RunCaseAnalysisInput, RunCaseAnalysisUseCase, RunPipelineUseCase,
};
use themis_domain::{CacheResetTarget, Model};
use themis_infrastructure::{
    ConfigLoader, FileConfig, JsonCacheStore, JsonlCallLogOpener, LocalArtifactStore,
    MarkdownQuestionFile, OllamaGateway, PdfDocumentSource, base_url,
};
use themis_presentation::{Cli, Command, ConsoleFormatter, ProgressReporter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Conventional exit status after SIGINT
const EXIT_CANCELLED: u8 = 130;

const LOG_FILE_NAME: &str = "themis.log";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.command.case_dir());

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Console logging by verbosity, plus `themis.log` in the case directory
fn init_logging(verbose: u8, case_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file, guard) = match case_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_level = if verbose >= 2 { level } else { "info" };
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(file_level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();

    guard
}

async fn run(cli: Cli) -> Result<ExitCode> {
    info!("Starting themis");

    let mut config = ConfigLoader::load(cli.config.as_deref())?;
    if let Some(host) = &cli.ollama_host {
        config.ollama_host = host.clone();
    }
    if let Some(port) = cli.ollama_port {
        config.ollama_port = port;
    }
    config.model = cli.resolve_model(&config.model);

    match &cli.command {
        Command::Config { reset: true, .. } => {
            let path = ConfigLoader::reset()?;
            println!("Configuration reset to defaults: {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Config { .. } => {
            ConfigLoader::print_config_sources(cli.config.as_deref());
            println!();
            print!("{}", config.to_toml().context("Could not render configuration")?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::ClearCache { case_dir, all, .. } => {
            let model = (!all).then(|| config.model());
            let target = match &model {
                Some(model) => CacheResetTarget::Model {
                    case_dir: case_dir.clone(),
                    model: model.clone(),
                },
                None => CacheResetTarget::All {
                    case_dir: case_dir.clone(),
                },
            };
            let removed = ClearCacheUseCase::new(Arc::new(JsonCacheStore::new()))
                .execute(&target)
                .await?;
            println!(
                "{}",
                ConsoleFormatter::format_cache_cleared(removed, case_dir, model.as_ref())
            );
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    // === Dependency Injection ===
    let url = base_url(&config.ollama_host, config.ollama_port);
    let gateway = Arc::new(OllamaGateway::new(&url, config.analysis.request_timeout())?);

    if cli.command.is_single_model() {
        check_backend(gateway.as_ref(), &url, cli.quiet).await?;
        remember_settings(&config, cli.command.case_dir());
    }

    let ports = PipelinePorts {
        gateway,
        documents: Arc::new(PdfDocumentSource::new()),
        questions: Arc::new(MarkdownQuestionFile::new()),
        cache: Arc::new(JsonCacheStore::new()),
        artifacts: Arc::new(LocalArtifactStore::new()),
        call_logs: Arc::new(JsonlCallLogOpener),
    };
    let params = config.analysis.to_params();

    let token = CancellationToken::new();
    spawn_interrupt_handler(token.clone());

    let progress: Box<dyn ProgressNotifier> = if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    let date = Local::now().date_naive();
    let model = config.model();

    match cli.command {
        Command::Analyze { dir, questions, .. } => {
            let mut input = RunCaseAnalysisInput::new(dir, model, date);
            if let Some(path) = questions.or(config.questions_file.clone()) {
                input = input.with_questions(path);
            }
            match RunCaseAnalysisUseCase::new(ports, params)
                .with_cancellation(token)
                .execute(input, progress.as_ref())
                .await
            {
                Ok(output) => {
                    println!("\n{}", ConsoleFormatter::format_analysis(&output));
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) if e.is_cancelled() => Ok(cancelled()),
                Err(e) => Err(e.into()),
            }
        }
        Command::Defend {
            case_dir, analysis, ..
        } => {
            let input = DefendInput::new(case_dir, model, date).with_analysis_file(analysis);
            let result = pipeline(ports, params, token)
                .defend(input, progress.as_ref())
                .await;
            finish_pipeline(result)
        }
        Command::FullProcess {
            case_dir, questions, ..
        } => {
            let input = FullProcessInput::new(case_dir, model, date)
                .with_questions(questions.or(config.questions_file.clone()));
            let result = pipeline(ports, params, token)
                .full_process(input, progress.as_ref())
                .await;
            finish_pipeline(result)
        }
        Command::AllModels {
            case_dir,
            models,
            questions,
        } => {
            let models = (!models.is_empty())
                .then(|| models.iter().map(Model::new).collect::<Vec<_>>());
            let input = RunAllModelsInput::new(case_dir, date)
                .with_models(models)
                .with_questions(questions.or(config.questions_file.clone()));
            let output = RunAllModelsUseCase::new(ports, params)
                .with_cancellation(token)
                .execute(input, progress.as_ref())
                .await?;
            println!("\n{}", ConsoleFormatter::format_comparison(&output));
            if output.cancelled {
                Ok(cancelled())
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Command::Config { .. } | Command::ClearCache { .. } => Ok(ExitCode::SUCCESS),
    }
}

fn pipeline(
    ports: PipelinePorts,
    params: PipelineParams,
    token: CancellationToken,
) -> RunPipelineUseCase {
    RunPipelineUseCase::new(ports, params).with_cancellation(token)
}

fn finish_pipeline(result: Result<PipelineOutput, PipelineError>) -> Result<ExitCode> {
    match result {
        Ok(output) => {
            println!("\n{}", ConsoleFormatter::format_pipeline(&output));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_cancelled() => Ok(cancelled()),
        Err(e) => Err(e.into()),
    }
}

fn cancelled() -> ExitCode {
    eprintln!("Cancelled. Results saved so far are kept.");
    ExitCode::from(EXIT_CANCELLED)
}

/// Cancel `token` on Ctrl-C; the pipeline stops at its next checkpoint
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current step");
            token.cancel();
        }
    });
}

/// Fail fast when the backend is unreachable
async fn check_backend(gateway: &dyn LlmGateway, url: &str, quiet: bool) -> Result<()> {
    let version = match gateway.server_version().await {
        Ok(version) => version,
        Err(e) => bail!(
            "Cannot reach Ollama at {} ({}). Is `ollama serve` running?",
            url,
            e
        ),
    };
    let models = gateway.available_models().await.unwrap_or_else(|e| {
        warn!("Could not list models: {}", e);
        Vec::new()
    });
    if !quiet {
        print!("{}", ConsoleFormatter::format_connectivity(url, &version, &models));
    }
    Ok(())
}

/// Persist model, backend and case directory to the global config file
fn remember_settings(config: &FileConfig, case_dir: Option<&Path>) {
    let mut global = match ConfigLoader::load_global() {
        Ok(global) => global,
        Err(e) => {
            warn!("Not saving settings, global config is unreadable: {}", e);
            return;
        }
    };
    global.model = config.model.clone();
    global.ollama_host = config.ollama_host.clone();
    global.ollama_port = config.ollama_port;
    if let Some(dir) = case_dir {
        global.last_case_dir = Some(absolute(dir));
    }

    if let Err(e) = ConfigLoader::save_global(&global) {
        warn!("Could not save settings: {}", e);
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
