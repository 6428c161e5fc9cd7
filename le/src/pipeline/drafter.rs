//! Template drafter: classification and goal to `DraftDocument`

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Category, DegradeReason, DraftDocument, Outcome};
use crate::llm::{Gateway, draft_sections};
use crate::prompts::{DraftContext, PromptLoader, SECTION_SENTINEL, Stage};

pub struct Drafter {
    gateway: Gateway,
    prompts: Arc<PromptLoader>,
}

impl Drafter {
    pub fn new(gateway: Gateway, prompts: Arc<PromptLoader>) -> Self {
        Self { gateway, prompts }
    }

    /// Draft a document with one generation request
    ///
    /// Never fails and never returns an empty letter. When no model answer is
    /// available the local letter template is used instead.
    pub async fn draft(&self, category: Category, jurisdiction: &str, facts: &str, goal: &str) -> Outcome<DraftDocument> {
        debug!(%category, %jurisdiction, facts_len = facts.len(), "Drafter::draft: called");
        let local = || split_sections(&draft_sections(category, jurisdiction, facts, goal)).into_value();

        let context = DraftContext::new(category.as_str(), jurisdiction, facts, goal);
        let prompt = match self.prompts.render(Stage::Draft, &context) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Drafter::draft: prompt failed, using local template");
                return Outcome::degraded(local(), DegradeReason::Prompt(e.to_string()));
            }
        };

        match self
            .gateway
            .generate(Stage::Draft, &prompt, Stage::Draft.max_tokens())
            .await
        {
            Ok(raw) => {
                let outcome = split_sections(&raw);
                if outcome.value().letter.is_empty() {
                    warn!("Drafter::draft: response held no letter text, using local template");
                    return Outcome::degraded(local(), DegradeReason::Unparseable("empty letter".to_string()));
                }
                outcome
            }
            Err(e) => {
                warn!(error = %e, "Drafter::draft: gateway failed, using local template");
                Outcome::degraded(local(), DegradeReason::Gateway(e.to_string()))
            }
        }
    }
}

/// Split a drafting response on the section sentinel
///
/// - no sentinel: the whole response is the letter (degraded)
/// - otherwise: purpose, letter, next steps; further segments are ignored
///
/// A sectioned response whose letter segment is blank falls back to the
/// whole response with the sentinels removed, also degraded.
pub fn split_sections(raw: &str) -> Outcome<DraftDocument> {
    if !raw.contains(SECTION_SENTINEL) {
        debug!("split_sections: no sentinel");
        return Outcome::degraded(
            DraftDocument {
                purpose: String::new(),
                letter: raw.trim().to_string(),
                next_steps: String::new(),
            },
            DegradeReason::Unsectioned,
        );
    }

    let mut parts = raw.split(SECTION_SENTINEL).map(str::trim);
    let purpose = parts.next().unwrap_or_default().to_string();
    let letter = parts.next().unwrap_or_default().to_string();
    let next_steps = parts.next().unwrap_or_default().to_string();

    if letter.is_empty() {
        debug!("split_sections: blank letter segment");
        let joined = raw
            .split(SECTION_SENTINEL)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        return Outcome::degraded(
            DraftDocument {
                purpose: String::new(),
                letter: joined,
                next_steps: String::new(),
            },
            DegradeReason::Unsectioned,
        );
    }

    Outcome::Structured(DraftDocument {
        purpose,
        letter,
        next_steps,
    })
}
