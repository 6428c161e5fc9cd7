//! Stage outputs: classification, draft and validation verdict

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Category;

/// Number of characters of the input kept as a fallback summary
pub const SUMMARY_FALLBACK_CHARS: usize = 200;

/// Placeholder the heuristic validator requires in every letter
pub const NAME_PLACEHOLDER: &str = "[NAME]";

/// Missing fact reported when the letter lacks `[NAME]`
pub const MISSING_NAME_FACT: &str = "recipient name placeholder [NAME]";

/// Result of classifying raw case text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub summary: String,
}

impl Classification {
    /// Deterministic classification used when the model cannot be relied on
    pub fn fallback(text: &str) -> Self {
        Self {
            category: Category::Other,
            tags: BTreeSet::new(),
            summary: truncated_summary(text),
        }
    }
}

/// First `SUMMARY_FALLBACK_CHARS` characters of `text`, never empty
pub fn truncated_summary(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(no description provided)".to_string();
    }
    trimmed.chars().take(SUMMARY_FALLBACK_CHARS).collect()
}

/// A drafted remedial document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftDocument {
    pub purpose: String,
    pub letter: String,
    pub next_steps: String,
}

/// Verdict on a draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    #[serde(default)]
    pub missing_facts: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    /// Placeholder check used when no structured verdict is available
    pub fn heuristic(letter: &str) -> Self {
        if letter.contains(NAME_PLACEHOLDER) {
            return Self {
                ok: true,
                missing_facts: Vec::new(),
                suggestions: Vec::new(),
            };
        }

        Self {
            ok: false,
            missing_facts: vec![MISSING_NAME_FACT.to_string()],
            suggestions: vec!["Add recipient name placeholder.".to_string()],
        }
    }
}
