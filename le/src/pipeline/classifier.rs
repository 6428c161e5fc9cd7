//! Issue classifier: raw case text to `Classification`

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::parse::{StringList, parse_embedded};
use crate::domain::{Category, Classification, DegradeReason, Outcome, truncated_summary};
use crate::llm::Gateway;
use crate::prompts::{ClassifyContext, PromptLoader, Stage};

#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: StringList,
    #[serde(default, alias = "summary")]
    short_summary: Option<String>,
}

pub struct Classifier {
    gateway: Gateway,
    prompts: Arc<PromptLoader>,
}

impl Classifier {
    pub fn new(gateway: Gateway, prompts: Arc<PromptLoader>) -> Self {
        Self { gateway, prompts }
    }

    /// Classify `text` with one generation request
    ///
    /// Never fails: an unusable answer degrades to category `other`, no tags,
    /// and the first 200 characters of the input as summary.
    pub async fn classify(&self, text: &str) -> Outcome<Classification> {
        debug!(len = text.len(), "Classifier::classify: called");
        let prompt = match self.prompts.render(Stage::Classify, &ClassifyContext { text }) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Classifier::classify: prompt failed, using fallback");
                return Outcome::degraded(Classification::fallback(text), DegradeReason::Prompt(e.to_string()));
            }
        };

        let raw = match self
            .gateway
            .generate(Stage::Classify, &prompt, Stage::Classify.max_tokens())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Classifier::classify: gateway failed, using fallback");
                return Outcome::degraded(Classification::fallback(text), DegradeReason::Gateway(e.to_string()));
            }
        };

        match parse_classification(&raw, text) {
            Ok(classification) => {
                debug!(category = %classification.category, "Classifier::classify: structured");
                Outcome::Structured(classification)
            }
            Err(e) => {
                warn!(error = %e, "Classifier::classify: unparseable response, using fallback");
                Outcome::degraded(Classification::fallback(text), DegradeReason::Unparseable(e))
            }
        }
    }
}

/// Parse a model answer; the input text backs an empty summary
pub fn parse_classification(raw: &str, input: &str) -> Result<Classification, String> {
    let parsed: RawClassification = parse_embedded(raw)?;

    let category = parsed
        .category
        .as_deref()
        .map(Category::parse)
        .unwrap_or(Category::Other);

    let summary = match parsed.short_summary {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => truncated_summary(input),
    };

    Ok(Classification {
        category,
        tags: parsed.tags.into_items().into_iter().collect(),
        summary,
    })
}
