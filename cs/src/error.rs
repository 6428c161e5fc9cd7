//! Journal error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No journal at {}", .0.display())]
    Missing(PathBuf),

    #[error("Corrupt journal {}: {source}", .path.display())]
    Corrupt { path: PathBuf, source: serde_json::Error },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    #[error("Id prefix '{prefix}' is ambiguous ({count} matches)")]
    AmbiguousId { prefix: String, count: usize },
}

impl JournalError {
    /// Check if retrying the append with a different id can succeed
    pub fn is_duplicate(&self) -> bool {
        matches!(self, JournalError::DuplicateId(_))
    }
}
