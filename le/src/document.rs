//! Text acquisition
//!
//! Turns a source file into plain case text. Plain text and Markdown are read
//! as UTF-8, HTML is converted to Markdown text. Binary formats such as PDF are
//! rejected: extracting them is left to an external tool.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported document type '{extension}' for {} (supported: txt, md, html)", .path.display())]
    Unsupported { path: PathBuf, extension: String },

    #[error("No text found in {}", .0.display())]
    Empty(PathBuf),
}

/// Normalize acquired text
///
/// Drops carriage returns, collapses runs of spaces and tabs, trims every
/// line, and keeps at most one blank line between paragraphs.
pub fn clean_text(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut blank_run = false;

    for line in text.split('\n') {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if !out.is_empty() && !blank_run {
                out.push(String::new());
            }
            blank_run = true;
        } else {
            out.push(line);
            blank_run = false;
        }
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Read case text from `path`, cleaned
pub fn load_text(path: &Path) -> Result<String, DocumentError> {
    debug!(path = %path.display(), "load_text: called");
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let read = || {
        fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    let raw = match extension.as_str() {
        "" | "txt" | "text" | "md" | "markdown" => read()?,
        "html" | "htm" => {
            debug!("load_text: converting HTML");
            html2md::rewrite_html(&read()?, false)
        }
        _ => {
            return Err(DocumentError::Unsupported {
                path: path.to_path_buf(),
                extension,
            });
        }
    };

    let text = clean_text(&raw);
    if text.is_empty() {
        return Err(DocumentError::Empty(path.to_path_buf()));
    }
    Ok(text)
}
