//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Unscatter - turn scattered thoughts into a task plan
#[derive(Parser)]
#[command(
    name = "us",
    about = "Turn a brain dump into clustered, prioritised tasks",
    version,
    after_help = "Logs are written to: ~/.local/share/unscatter/logs/unscatter.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long = "log-level",
        global = true,
        help = "Log level (trace, debug, info, warn, error); overrides the config file"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Analyze text and images once and print the plan
    Analyze {
        /// Text to analyze; read from stdin when neither this nor --file is given
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Attach an image (png, jpeg, webp); may be repeated
        #[arg(short, long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check that the analysis service is reachable
    Health,

    /// Print text as it would be sent after filtering
    Sanitize {
        /// Text to sanitize; read from stdin when omitted
        text: Option<String>,
    },

    /// Start an interactive session
    Repl,
}

/// Output format for analysis results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Location of the log file
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("unscatter")
        .join("logs")
        .join("unscatter.log")
}
