//! Prompt Template System
//!
//! Each pipeline stage renders one `.pmt` template into the user message of a
//! single generation request, and pairs it with a fixed system prompt.
//!
//! Template loading chain:
//! 1. `.legalease/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (repo default)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{ClassifyContext, DraftContext, PromptLoader, ValidateContext};

use tracing::debug;

/// Marker separating purpose, letter and next steps in a drafting response
pub const SECTION_SENTINEL: &str = "===SECTION===";

/// Pipeline stage issuing a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Classify,
    Draft,
    Validate,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Classify, Stage::Draft, Stage::Validate];

    /// Template name (file stem of the `.pmt`)
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Classify => "classify",
            Stage::Draft => "draft",
            Stage::Validate => "validate",
        }
    }

    /// Fixed system prompt sent with every request of this stage
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Stage::Classify => "You are a legal issue classifier.",
            Stage::Draft => {
                "You are a professional legal assistant that drafts concise, plain-English demand letters and templates."
            }
            Stage::Validate => "You are a template quality checker.",
        }
    }

    /// Output token limit requested for this stage
    pub fn max_tokens(&self) -> u32 {
        match self {
            Stage::Classify => 300,
            Stage::Draft => 800,
            Stage::Validate => 250,
        }
    }

    /// Recover the stage from a request's system prompt
    pub fn from_system_prompt(system_prompt: &str) -> Option<Self> {
        debug!("Stage::from_system_prompt: called");
        Self::ALL.into_iter().find(|s| s.system_prompt() == system_prompt)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
