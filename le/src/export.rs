//! Rendering and exporting cases
//!
//! The pipeline hands every stored case to an `Exporter`. The stock one
//! writes `case_<id>.md` (or `.json`) into the configured export directory.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::Case;

/// Output format of an exported case
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Json => "json",
        }
    }
}

/// Render a case as a Markdown document
pub fn render_markdown(case: &Case) -> String {
    debug!(case_id = %case.case_id, "render_markdown: called");
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "# Case {}\n", case.case_id);
    let _ = writeln!(out, "## Category\n\n{}\n", case.category);
    let _ = writeln!(
        out,
        "- Jurisdiction: {}\n- Goal: {}\n- Status: {}\n- Retries: {}\n- Created: {}\n",
        or_dash(&case.jurisdiction),
        or_dash(&case.goal),
        case.status,
        case.retries,
        case.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "## Facts\n\n{}\n", case.facts);
    let _ = writeln!(out, "## Purpose\n\n{}\n", or_dash(&case.draft.purpose));
    let _ = writeln!(out, "## Letter\n\n{}\n", case.draft.letter);
    let _ = writeln!(out, "## Next steps\n\n{}\n", or_dash(&case.draft.next_steps));

    let validation = &case.validation;
    let _ = writeln!(
        out,
        "## Validation\n\n{}\n",
        if validation.ok { "Passed" } else { "Needs attention" }
    );
    for fact in &validation.missing_facts {
        let _ = writeln!(out, "- Missing: {}", fact);
    }
    for suggestion in &validation.suggestions {
        let _ = writeln!(out, "- Suggestion: {}", suggestion);
    }

    out.trim_end().to_string() + "\n"
}

/// Render a case as a pretty JSON report
pub fn render_json(case: &Case) -> Result<String> {
    debug!(case_id = %case.case_id, "render_json: called");
    serde_json::to_string_pretty(case).context("Failed to serialize case")
}

/// Render a case in `format`
pub fn render(case: &Case, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Markdown => Ok(render_markdown(case)),
        ExportFormat::Json => render_json(case),
    }
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

/// Receives every stored case
pub trait Exporter: Send + Sync {
    /// Export `case`, returning where it went
    fn export(&self, case: &Case) -> Result<PathBuf>;
}

/// Writes cases as files into a directory
#[derive(Debug, Clone)]
pub struct FileExporter {
    dir: PathBuf,
    format: ExportFormat,
}

impl FileExporter {
    pub fn new(dir: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name of an exported case
    pub fn file_name(&self, case: &Case) -> String {
        format!("case_{}.{}", case.case_id, self.format.extension())
    }
}

impl Exporter for FileExporter {
    fn export(&self, case: &Case) -> Result<PathBuf> {
        debug!(case_id = %case.case_id, dir = %self.dir.display(), "FileExporter::export: called");
        fs::create_dir_all(&self.dir).context(format!("Failed to create export directory {}", self.dir.display()))?;

        let path = self.dir.join(self.file_name(case));
        let body = render(case, self.format)?;
        fs::write(&path, body).context(format!("Failed to write {}", path.display()))?;

        info!(path = %path.display(), "Exported case");
        Ok(path)
    }
}
