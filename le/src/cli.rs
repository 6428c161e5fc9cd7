//! CLI command definitions and subcommands

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::export::ExportFormat;

/// LegalEase - classify, draft and validate legal letters
#[derive(Parser)]
#[command(
    name = "le",
    about = "Turn a description of a legal problem into a validated draft letter",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process one case end to end
    #[command(group(ArgGroup::new("input").required(true).args(["text", "file"])))]
    Process {
        /// Problem description
        #[arg(short, long)]
        text: Option<String>,

        /// Read the description from a .txt, .md or .html file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Jurisdiction (defaults to pipeline.jurisdiction)
        #[arg(short, long)]
        jurisdiction: Option<String>,

        /// What the letter should achieve (defaults to pipeline.goal)
        #[arg(short, long)]
        goal: Option<String>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Use the deterministic offline backend
        #[arg(long)]
        offline: bool,
    },

    /// Process several case files concurrently
    Batch {
        /// Case files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Cases in flight at once (defaults to concurrency.max-cases)
        #[arg(short = 'J', long)]
        jobs: Option<usize>,

        /// Jurisdiction applied to every case
        #[arg(short, long)]
        jurisdiction: Option<String>,

        /// Goal applied to every case
        #[arg(short, long)]
        goal: Option<String>,

        /// Use the deterministic offline backend
        #[arg(long)]
        offline: bool,
    },

    /// Inspect stored cases
    Cases {
        #[command(subcommand)]
        command: CasesCommand,
    },

    /// Render a stored case into the export directory
    Export {
        /// Case ID (or unique prefix)
        id: String,

        /// Document format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
    },
}

/// Case inspection subcommands
#[derive(Debug, Subcommand)]
pub enum CasesCommand {
    /// List stored cases
    List {
        /// Only cases of this category (landlord_tenant, employment, consumer, contract, family, other)
        #[arg(short = 'C', long)]
        category: Option<String>,
    },

    /// Show one case in full
    Show {
        /// Case ID (or unique prefix)
        id: String,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("legalease")
        .join("logs")
        .join("legalease.log")
}

/// Help footer pointing at the log file
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    format!(
        "Logs are written to: {}\nSet OPENAI_API_KEY (or the configured api-key-env) to use a hosted model;\nwithout it the offline backend is used.\n",
        get_log_path().display()
    )
}

/// Output format for `process`
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
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
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
