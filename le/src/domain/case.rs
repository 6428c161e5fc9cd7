//! Case domain type
//!
//! One complete run of the pipeline for a single problem description.
//! Immutable once it has been appended to the case store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use super::{CaseId, Category, Classification, DraftDocument, ValidationResult};

/// Final status of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// The retry loop terminated and a draft exists
    #[default]
    Drafted,
    /// Nothing usable could be produced
    Failed,
    /// The retry ceiling was hit and the case was flagged for a human
    NeedsReview,
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drafted => write!(f, "drafted"),
            Self::Failed => write!(f, "failed"),
            Self::NeedsReview => write!(f, "needs_review"),
        }
    }
}

/// A processed case as persisted in the case store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub case_id: CaseId,

    pub created_at: DateTime<Utc>,

    pub category: Category,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Classifier summary the facts started from
    #[serde(default)]
    pub summary: String,

    /// Narrative fed to the drafter, including any repair markers
    pub facts: String,

    #[serde(default)]
    pub jurisdiction: String,

    #[serde(default)]
    pub goal: String,

    /// Latest draft
    pub draft: DraftDocument,

    /// Verdict on the latest draft
    #[serde(default)]
    pub validation: ValidationResult,

    /// Repair rounds performed after the initial attempt
    #[serde(default)]
    pub retries: u32,

    pub status: CaseStatus,

    /// Where the text came from (file path), if not typed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Case {
    /// Assemble a case from the terminal state of the retry loop
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        case_id: CaseId,
        classification: &Classification,
        facts: String,
        jurisdiction: &str,
        goal: &str,
        draft: DraftDocument,
        validation: ValidationResult,
        retries: u32,
        status: CaseStatus,
    ) -> Self {
        debug!(%case_id, %retries, %status, "Case::assemble: called");
        Self {
            case_id,
            created_at: Utc::now(),
            category: classification.category,
            tags: classification.tags.clone(),
            summary: classification.summary.clone(),
            facts,
            jurisdiction: jurisdiction.to_string(),
            goal: goal.to_string(),
            draft,
            validation,
            retries,
            status,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl casestore::Record for Case {
    fn record_id(&self) -> &str {
        self.case_id.as_str()
    }
}
