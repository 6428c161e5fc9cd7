//! Deterministic offline stand-in for the language model
//!
//! Routes on the fixed per-stage system prompt and answers from local rules,
//! so identical inputs always produce identical outputs:
//! - classify: keyword-scored category as JSON
//! - draft: a three-section letter template
//! - validate: free text with no structured verdict, which sends the
//!   validator down its heuristic path

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use crate::domain::{Category, Classification, truncated_summary};
use crate::prompts::{SECTION_SENTINEL, Stage};

/// Response of the offline validator
pub const OFFLINE_REVIEW: &str = "Offline review: no model available, structured verdict not produced.";

/// Keywords per category; a category scores one point per keyword present
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::LandlordTenant,
        &[
            "landlord", "tenant", "rent", "lease", "evict", "deposit", "apartment", "flat", "housing",
        ],
    ),
    (
        Category::Employment,
        &[
            "employer", "boss", "wage", "salary", "fired", "overtime", "paycheck", "workplace", "dismiss",
        ],
    ),
    (
        Category::Consumer,
        &[
            "refund", "store", "shop", "product", "warranty", "purchase", "defective", "seller", "merchant",
        ],
    ),
    (
        Category::Contract,
        &["contract", "agreement", "breach", "invoice", "contractor", "signed", "clause"],
    ),
    (
        Category::Family,
        &["divorce", "custody", "child support", "spouse", "alimony", "marriage", "visitation"],
    ),
];

/// Offline LLM client
#[derive(Debug, Clone, Default)]
pub struct OfflineClient;

impl OfflineClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmClient for OfflineClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!("OfflineClient::complete: called");
        let stage = Stage::from_system_prompt(&request.system_prompt)
            .ok_or_else(|| LlmError::InvalidResponse("offline client cannot route this request".to_string()))?;
        let prompt = request.user_text().unwrap_or_default();

        let text = match stage {
            Stage::Classify => classify_response(prompt)?,
            Stage::Draft => draft_response(prompt),
            Stage::Validate => OFFLINE_REVIEW.to_string(),
        };
        debug!(%stage, len = text.len(), "OfflineClient::complete: answered");
        Ok(CompletionResponse::text(text))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// Keyword classification of free text
pub fn classify_text(text: &str) -> Classification {
    debug!(len = text.len(), "classify_text: called");
    let lower = text.to_lowercase();

    let mut best = (Category::Other, 0usize);
    let mut tags = BTreeSet::new();
    for (category, words) in KEYWORDS {
        let hits: Vec<&str> = words.iter().copied().filter(|w| lower.contains(w)).collect();
        if hits.len() > best.1 {
            best = (*category, hits.len());
        }
        tags.extend(hits.into_iter().map(|w| w.replace(' ', "_")));
    }

    Classification {
        category: best.0,
        tags,
        summary: summarize(text),
    }
}

/// Three sentinel-separated sections: purpose, letter, next steps
pub fn draft_sections(category: Category, jurisdiction: &str, facts: &str, goal: &str) -> String {
    debug!(%category, "draft_sections: called");
    let purpose = format!(
        "Purpose: To formally notify the recipient of a {} matter ({}) and {}.",
        category.label().to_lowercase(),
        jurisdiction,
        lowercase_first(goal.trim().trim_end_matches('.'))
    );

    let letter = format!(
        "[DATE]\n\n[NAME]\n[ADDRESS]\n\nDear [NAME],\n\n\
         I am writing about the following matter: {}\n\n\
         {}\n\n\
         I ask that you respond in writing within 14 days of the date of this letter. \
         What I am seeking: {}.\n\n\
         Sincerely,\n[YOUR NAME]",
        facts.trim(),
        category_paragraph(category),
        goal.trim().trim_end_matches('.')
    );

    let next_steps = "1) Send the letter by a trackable method and keep a copy.\n\
                      2) Wait 14 days for a written response.\n\
                      3) Contact a local legal aid office if the matter is not resolved.";

    format!(
        "{purpose}\n{s}\n{letter}\n{s}\n{next_steps}",
        s = SECTION_SENTINEL
    )
}

fn category_paragraph(category: Category) -> &'static str {
    match category {
        Category::LandlordTenant => {
            "As a tenant I am entitled to essential services and the quiet enjoyment of the premises under the terms of my lease."
        }
        Category::Employment => "I am entitled to be paid and treated in accordance with my employment terms and applicable law.",
        Category::Consumer => "I purchased goods or services in good faith and expect them to be as described and fit for purpose.",
        Category::Contract => "Our agreement sets out obligations that, in my view, have not been met.",
        Category::Family => "I would like to resolve this matter cooperatively and in the best interests of everyone involved.",
        Category::Other => "I would like to resolve this matter promptly and without further escalation.",
    }
}

fn classify_response(prompt: &str) -> Result<String, LlmError> {
    let classification = classify_text(quoted_block(prompt));
    let json = serde_json::json!({
        "category": classification.category.as_str(),
        "tags": classification.tags,
        "short_summary": classification.summary,
    });
    Ok(serde_json::to_string(&json)?)
}

fn draft_response(prompt: &str) -> String {
    let field = |name: &str| {
        prompt
            .lines()
            .find_map(|l| l.trim().strip_prefix(&format!("- {}:", name)).map(str::trim))
            .unwrap_or_default()
            .to_string()
    };
    let (facts, goal) = facts_and_goal(prompt);

    draft_sections(
        Category::parse(&field("category")),
        &non_empty_or(field("jurisdiction"), "Unknown"),
        facts,
        &non_empty_or(goal.to_string(), "Request compliance"),
    )
}

/// Facts span every line from `- facts:` up to the last `- user_goal:` line
fn facts_and_goal(prompt: &str) -> (&str, &str) {
    const FACTS: &str = "- facts:";
    const GOAL: &str = "\n- user_goal:";

    let Some(start) = prompt.find(FACTS).map(|i| i + FACTS.len()) else {
        return ("", "");
    };
    let rest = &prompt[start..];
    match rest.rfind(GOAL) {
        Some(end) => {
            let goal = rest[end + GOAL.len()..].lines().next().unwrap_or_default();
            (rest[..end].trim(), goal.trim())
        }
        None => (rest.lines().next().unwrap_or_default().trim(), ""),
    }
}

/// Text between the first and last triple quote, or the whole prompt
fn quoted_block(prompt: &str) -> &str {
    match (prompt.find("\"\"\""), prompt.rfind("\"\"\"")) {
        (Some(start), Some(end)) if end > start + 3 => &prompt[start + 3..end],
        _ => prompt,
    }
}

/// Up to two sentences, capped like the fallback summary
fn summarize(text: &str) -> String {
    let trimmed = text.trim();
    let mut end = trimmed.len();
    let mut sentences = 0;
    for (i, c) in trimmed.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            sentences += 1;
            if sentences == 2 {
                end = i + c.len_utf8();
                break;
            }
        }
    }
    truncated_summary(&trimmed[..end])
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.is_empty() { default.to_string() } else { value }
}
