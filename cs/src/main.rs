use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use casestore::{Journal, Record};
use casestore::cli::{Cli, Command};
use casestore::config::Config;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn field<'a>(record: &'a serde_json::Value, key: &str) -> &'a str {
    record.get(key).and_then(|v| v.as_str()).unwrap_or("-")
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.unwrap_or(config.store_path);

    info!("cs opening {}", store_path.display());
    let journal: Journal<serde_json::Value> =
        Journal::open_existing(&store_path).context(format!("Failed to open journal {}", store_path.display()))?;

    match cli.command {
        Command::List => {
            if journal.is_empty() {
                println!("No records found");
            }
            for record in journal.records() {
                println!(
                    "{} {} {} {}",
                    record.record_id().cyan(),
                    field(record, "category").yellow(),
                    field(record, "status"),
                    field(record, "created_at").dimmed()
                );
            }
        }
        Command::Show { id } => match journal.resolve(&id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(record)?),
            None => return Err(eyre::eyre!("No record matches '{}'", id)),
        },
        Command::Count => {
            println!("{}", journal.len());
        }
    }

    Ok(())
}
