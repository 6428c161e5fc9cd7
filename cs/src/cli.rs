//! CLI argument parsing for casestore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cs")]
#[command(author, version, about = "Inspect an append-only case journal", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the journal document (overrides config)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all records in append order
    List,

    /// Print one record as JSON
    Show {
        /// Record id or unique prefix
        #[arg(required = true)]
        id: String,
    },

    /// Print the number of records
    Count,
}
