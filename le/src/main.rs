//! LegalEase - legal case pipeline
//!
//! CLI entry point for processing, inspecting and exporting cases.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use legalease::cli::{CasesCommand, Cli, Command, OutputFormat, generate_after_help, get_log_path};
use legalease::config::Config;
use legalease::document;
use legalease::domain::{Case, CaseStatus, Category};
use legalease::export::{ExportFormat, Exporter, FileExporter, render_markdown};
use legalease::pipeline::{CaseRequest, Orchestrator, ProcessedCase};
use legalease::state::CaseStore;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging is not up yet, so nothing in here can log
    let log_path = get_log_path();
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
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

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(provider = %config.llm.provider, model = %config.llm.model, "LegalEase loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Process {
            text,
            file,
            jurisdiction,
            goal,
            format,
            offline,
        } => {
            debug!(?file, offline, %format, "main: matched Process command");
            config.llm.offline |= offline;
            cmd_process(&config, text, file, jurisdiction, goal, format).await
        }
        Command::Batch {
            files,
            jobs,
            jurisdiction,
            goal,
            offline,
        } => {
            debug!(count = files.len(), ?jobs, offline, "main: matched Batch command");
            config.llm.offline |= offline;
            let jobs = jobs.unwrap_or(config.concurrency.max_cases);
            cmd_batch(&config, files, jobs, jurisdiction, goal).await
        }
        Command::Cases { command } => match command {
            CasesCommand::List { category } => {
                debug!(?category, "main: matched CasesCommand::List");
                cmd_cases_list(&config, category.as_deref()).await
            }
            CasesCommand::Show { id } => {
                debug!(%id, "main: matched CasesCommand::Show");
                cmd_cases_show(&config, &id).await
            }
        },
        Command::Export { id, format } => {
            debug!(%id, ?format, "main: matched Export command");
            cmd_export(&config, &id, format).await
        }
    }
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let root = std::env::current_dir().context("Failed to read current directory")?;
    Orchestrator::from_config(config, &root).context("Failed to start the pipeline")
}

fn source_label(path: &Path) -> String {
    path.display().to_string()
}

/// Process one case and print the result
async fn cmd_process(
    config: &Config,
    text: Option<String>,
    file: Option<PathBuf>,
    jurisdiction: Option<String>,
    goal: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    debug!("cmd_process: called");
    let (text, source) = match (text, file) {
        (Some(text), _) => (document::clean_text(&text), None),
        (None, Some(path)) => (document::load_text(&path)?, Some(source_label(&path))),
        (None, None) => return Err(eyre::eyre!("Give --text or --file")),
    };
    if text.is_empty() {
        return Err(eyre::eyre!("Case text is empty"));
    }

    let orchestrator = build_orchestrator(config)?;
    let processed = orchestrator
        .process(CaseRequest {
            text,
            jurisdiction,
            goal,
            source,
        })
        .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&processed)?),
        OutputFormat::Text => print_processed(&processed),
    }
    Ok(())
}

fn status_colored(status: CaseStatus) -> ColoredString {
    match status {
        CaseStatus::Drafted => status.to_string().green(),
        CaseStatus::NeedsReview => status.to_string().yellow(),
        CaseStatus::Failed => status.to_string().red(),
    }
}

fn print_processed(processed: &ProcessedCase) {
    let case = &processed.case;
    println!("{} {}", "Case".bold(), case.case_id.to_string().cyan());
    println!("  Category:     {}", case.category.label());
    println!("  Jurisdiction: {}", case.jurisdiction);
    println!("  Status:       {}", status_colored(case.status));
    println!("  Rounds:       {} (retries: {})", processed.rounds(), case.retries);
    println!(
        "  Validation:   {}",
        if case.validation.ok {
            "passed".green()
        } else {
            "needs attention".yellow()
        }
    );
    for fact in &case.validation.missing_facts {
        println!("    - missing: {}", fact);
    }
    if !processed.fallbacks.is_empty() {
        println!("  Fallbacks:    {}", processed.fallbacks.len().to_string().dimmed());
    }
    match &processed.export_path {
        Some(path) => println!("  Exported:     {}", path.display()),
        None => println!("  Exported:     {}", "no".dimmed()),
    }
    println!();
    println!("{}", case.draft.letter);
}

/// Process several files with a bounded worker pool
async fn cmd_batch(
    config: &Config,
    files: Vec<PathBuf>,
    jobs: usize,
    jurisdiction: Option<String>,
    goal: Option<String>,
) -> Result<()> {
    debug!(count = files.len(), jobs, "cmd_batch: called");
    let mut requests = Vec::new();
    let mut failed = 0;

    for path in &files {
        match document::load_text(path) {
            Ok(text) => requests.push(CaseRequest {
                text,
                jurisdiction: jurisdiction.clone(),
                goal: goal.clone(),
                source: Some(source_label(path)),
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable case file");
                eprintln!("{} {}", "skipped".red(), e);
                failed += 1;
            }
        }
    }

    let orchestrator = build_orchestrator(config)?;
    let total = files.len();
    for result in orchestrator.process_batch(requests, jobs).await {
        match result {
            Ok(processed) => {
                let case = &processed.case;
                println!(
                    "{} {:<16} {:<12} retries={} {}",
                    case.case_id.to_string().cyan(),
                    case.category.as_str(),
                    status_colored(case.status),
                    case.retries,
                    case.source.as_deref().unwrap_or("-").dimmed()
                );
            }
            Err(e) => {
                eprintln!("{} {}", "failed".red(), e);
                failed += 1;
            }
        }
    }

    info!(total, failed, "Batch finished");
    if failed > 0 {
        return Err(eyre::eyre!("{} of {} cases failed", failed, total));
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<CaseStore> {
    let path = &config.storage.case_store;
    CaseStore::spawn(path).context(format!("Failed to open case store {}", path.display()))
}

fn print_case_line(case: &Case) {
    println!(
        "{} {:<16} {:<12} {}",
        case.case_id.to_string().cyan(),
        case.category.as_str().yellow(),
        status_colored(case.status),
        case.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
}

/// List stored cases
async fn cmd_cases_list(config: &Config, category: Option<&str>) -> Result<()> {
    debug!(?category, "cmd_cases_list: called");
    let store = open_store(config)?;
    let cases = match category {
        Some(c) => store.list_by_category(Category::parse(c)).await?,
        None => store.list_all().await?,
    };

    if cases.is_empty() {
        println!("No cases found");
    }
    for case in &cases {
        print_case_line(case);
    }
    Ok(())
}

/// Show one stored case
async fn cmd_cases_show(config: &Config, id: &str) -> Result<()> {
    debug!(%id, "cmd_cases_show: called");
    let store = open_store(config)?;
    let case = store.get(id).await.context(format!("No case matches '{}'", id))?;
    print!("{}", render_markdown(&case));
    Ok(())
}

/// Export one stored case
async fn cmd_export(config: &Config, id: &str, format: ExportFormat) -> Result<()> {
    debug!(%id, ?format, "cmd_export: called");
    let store = open_store(config)?;
    let case = store.get(id).await.context(format!("No case matches '{}'", id))?;

    let exporter = FileExporter::new(&config.storage.export_dir, format);
    let path = exporter.export(&case)?;
    println!("{}", path.display());
    Ok(())
}
