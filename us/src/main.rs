//! Unscatter - brain dump in, task plan out
//!
//! CLI entry point for one-shot analysis, health checks and the REPL.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use unscatter::cli::{Cli, Command, OutputFormat, get_log_path};
use unscatter::config::Config;
use unscatter::domain::{ImagePayload, load_image};
use unscatter::gateway::AnalysisGateway;
use unscatter::render::render_plan;
use unscatter::{Sanitizer, repl};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging must exist before the full config load so its messages land in the log
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("Unscatter loaded config: base_url={}", config.api.base_url);

    match cli.command {
        Some(Command::Analyze {
            text,
            file,
            images,
            format,
        }) => cmd_analyze(&config, text, file, &images, format).await,
        Some(Command::Health) => cmd_health(&config).await,
        Some(Command::Sanitize { text }) => cmd_sanitize(&config, text),
        Some(Command::Repl) => repl::run_interactive(&config).await,
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Resolve input text from an argument, a file, or piped stdin
fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    if let Some(path) = file {
        debug!(path = %path.display(), "read_input: reading file");
        return fs::read_to_string(&path).context(format!("Failed to read {}", path.display()));
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(String::new());
    }

    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf).context("Failed to read stdin")?;
    Ok(buf)
}

/// Analyze once and print the plan
async fn cmd_analyze(
    config: &Config,
    text: Option<String>,
    file: Option<PathBuf>,
    image_paths: &[PathBuf],
    format: OutputFormat,
) -> Result<()> {
    let input = read_input(text, file)?;
    let images = image_paths
        .iter()
        .map(|p| load_image(p))
        .collect::<Result<Vec<ImagePayload>, _>>()?;

    let gateway = AnalysisGateway::from_config(config).context("Failed to create analysis client")?;

    match gateway.analyze(&input, &images).await {
        Ok(result) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result.as_ref())?),
                OutputFormat::Text => print!("{}", render_plan(&result)),
            }
            Ok(())
        }
        Err(e) => Err(eyre::eyre!("{}", e)),
    }
}

/// Probe the analysis service
async fn cmd_health(config: &Config) -> Result<()> {
    let gateway = AnalysisGateway::from_config(config).context("Failed to create analysis client")?;

    match gateway.health().await {
        Ok(status) if status.is_ok() => {
            println!("{} {} ({})", "✓".green(), config.api.base_url, status.timestamp.to_rfc3339());
            Ok(())
        }
        Ok(status) => Err(eyre::eyre!("Service reported status '{}'", status.status)),
        Err(e) => Err(eyre::eyre!("{}", e)),
    }
}

/// Print the filtered text without contacting the service
fn cmd_sanitize(config: &Config, text: Option<String>) -> Result<()> {
    let input = read_input(text, None)?;
    let sanitizer = Sanitizer::new(config.input.max_text_length);
    println!("{}", sanitizer.sanitize(&input));
    Ok(())
}
