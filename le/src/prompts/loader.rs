//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::{SECTION_SENTINEL, Stage, embedded};

/// Template variables for the classify stage
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyContext<'a> {
    pub text: &'a str,
}

/// Template variables for the draft stage
#[derive(Debug, Clone, Serialize)]
pub struct DraftContext<'a> {
    pub category: &'a str,
    pub jurisdiction: &'a str,
    pub facts: &'a str,
    pub goal: &'a str,
    pub sentinel: &'static str,
}

impl<'a> DraftContext<'a> {
    pub fn new(category: &'a str, jurisdiction: &'a str, facts: &'a str, goal: &'a str) -> Self {
        Self {
            category,
            jurisdiction,
            facts,
            goal,
            sentinel: SECTION_SENTINEL,
        }
    }
}

/// Template variables for the validate stage
#[derive(Debug, Clone, Serialize)]
pub struct ValidateContext<'a> {
    pub draft: &'a str,
    pub facts: &'a str,
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.legalease/prompts/`)
    user_dir: Option<PathBuf>,
    /// Repo default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `root`, looking for `.legalease/prompts/`
    /// and `prompts/` beneath it
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        debug!(?root, "PromptLoader::new: called");
        let user_dir = root.join(".legalease").join("prompts");
        let repo_dir = root.join("prompts");

        let user_dir_exists = user_dir.is_dir();
        let repo_dir_exists = repo_dir.is_dir();
        debug!(%user_dir_exists, %repo_dir_exists, "PromptLoader::new: checked directories");

        Self {
            hbs: Self::engine(),
            user_dir: user_dir_exists.then_some(user_dir),
            repo_dir: repo_dir_exists.then_some(repo_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text: quotes and brackets must pass through untouched
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.legalease/prompts/{name}.pmt`
    /// 2. Repo default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render the template of `stage` with the given context
    pub fn render<C: Serialize>(&self, stage: Stage, context: &C) -> Result<String> {
        debug!(%stage, "PromptLoader::render: called");
        let template = self.load_template(stage.name())?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", stage.name(), e))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_classify_keeps_text_verbatim() {
        let loader = PromptLoader::embedded_only();
        let text = r#"He said "pay <now>" & left [NAME]"#;
        let prompt = loader.render(Stage::Classify, &ClassifyContext { text }).unwrap();
        assert!(prompt.contains(&format!("\"\"\"{}\"\"\"", text)));
    }

    #[test]
    fn test_render_draft_includes_all_inputs() {
        let loader = PromptLoader::embedded_only();
        let ctx = DraftContext::new("employment", "Ontario", "Unpaid overtime", "Get paid");
        let prompt = loader.render(Stage::Draft, &ctx).unwrap();

        assert!(prompt.contains("- category: employment"));
        assert!(prompt.contains("- jurisdiction: Ontario"));
        assert!(prompt.contains("- facts: Unpaid overtime"));
        assert!(prompt.contains("- user_goal: Get paid"));
        assert!(prompt.contains(SECTION_SENTINEL));
    }

    #[test]
    fn test_user_override_wins_over_repo_and_embedded() {
        let temp = TempDir::new().unwrap();
        let user = temp.path().join(".legalease").join("prompts");
        let repo = temp.path().join("prompts");
        std::fs::create_dir_all(&user).unwrap();
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::write(user.join("validate.pmt"), "user {{draft}}").unwrap();
        std::fs::write(repo.join("validate.pmt"), "repo {{draft}}").unwrap();
        std::fs::write(repo.join("classify.pmt"), "repo {{text}}").unwrap();

        let loader = PromptLoader::new(temp.path());
        let ctx = ValidateContext { draft: "d", facts: "f" };
        assert_eq!(loader.render(Stage::Validate, &ctx).unwrap(), "user d");
        assert_eq!(loader.render(Stage::Classify, &ClassifyContext { text: "t" }).unwrap(), "repo t");

        // draft has no override and comes from the embedded copy
        let ctx = DraftContext::new("other", "Unknown", "x", "y");
        assert!(loader.render(Stage::Draft, &ctx).unwrap().contains("- facts: x"));
    }

    #[test]
    fn test_unknown_template_is_an_error() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
