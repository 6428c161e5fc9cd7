//! Draft validator: letter and facts to `ValidationResult`

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::parse::{StringList, parse_embedded};
use crate::domain::{DegradeReason, Outcome, ValidationResult};
use crate::llm::Gateway;
use crate::prompts::{PromptLoader, Stage, ValidateContext};

#[derive(Debug, Deserialize)]
struct RawVerdict {
    ok: bool,
    #[serde(default)]
    missing_facts: StringList,
    #[serde(default)]
    suggestions: StringList,
}

pub struct Validator {
    gateway: Gateway,
    prompts: Arc<PromptLoader>,
}

impl Validator {
    pub fn new(gateway: Gateway, prompts: Arc<PromptLoader>) -> Self {
        Self { gateway, prompts }
    }

    /// Judge `letter` against `facts` with one generation request
    ///
    /// A structured verdict is trusted as reported. Anything else falls back
    /// to the `[NAME]` placeholder check.
    pub async fn validate(&self, letter: &str, facts: &str) -> Outcome<ValidationResult> {
        debug!(letter_len = letter.len(), "Validator::validate: called");
        let prompt = match self
            .prompts
            .render(Stage::Validate, &ValidateContext { draft: letter, facts })
        {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Validator::validate: prompt failed, using heuristic");
                return Outcome::degraded(ValidationResult::heuristic(letter), DegradeReason::Prompt(e.to_string()));
            }
        };

        let raw = match self
            .gateway
            .generate(Stage::Validate, &prompt, Stage::Validate.max_tokens())
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Validator::validate: gateway failed, using heuristic");
                return Outcome::degraded(ValidationResult::heuristic(letter), DegradeReason::Gateway(e.to_string()));
            }
        };

        match parse_embedded::<RawVerdict>(&raw) {
            Ok(verdict) => {
                debug!(ok = verdict.ok, "Validator::validate: structured verdict");
                Outcome::Structured(ValidationResult {
                    ok: verdict.ok,
                    missing_facts: verdict.missing_facts.into_items(),
                    suggestions: verdict.suggestions.into_items(),
                })
            }
            Err(e) => {
                debug!(error = %e, "Validator::validate: no structured verdict, using heuristic");
                Outcome::degraded(ValidationResult::heuristic(letter), DegradeReason::Unparseable(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MISSING_NAME_FACT;
    use crate::llm::client::mock::MockLlmClient;
    use std::time::Duration;

    fn validator(responses: Vec<Result<&str, &str>>) -> Validator {
        let gateway = Gateway::new(
            Arc::new(MockLlmClient::with_results(responses)),
            Duration::from_secs(1),
            1000,
        );
        Validator::new(gateway, Arc::new(PromptLoader::embedded_only()))
    }

    #[tokio::test]
    async fn test_structured_verdict_is_trusted() {
        // ok=true with missing facts is kept as reported
        let v = validator(vec![Ok(
            r#"{"ok": true, "missing_facts": ["date of shut-off"], "suggestions": ["Cite the lease."]}"#,
        )]);
        let outcome = v.validate("Dear landlord", "facts").await;

        assert!(!outcome.is_degraded());
        let result = outcome.into_value();
        assert!(result.ok);
        assert_eq!(result.missing_facts, vec!["date of shut-off"]);
        assert_eq!(result.suggestions, vec!["Cite the lease."]);
    }

    #[tokio::test]
    async fn test_non_json_uses_heuristic() {
        let outcome = validator(vec![Ok("Looks fine to me.")]).validate("Dear [NAME],", "f").await;
        assert!(matches!(outcome.reason(), Some(DegradeReason::Unparseable(_))));
        assert!(outcome.value().ok);

        let outcome = validator(vec![Ok("Looks fine to me.")]).validate("Dear Sir,", "f").await;
        let result = outcome.into_value();
        assert!(!result.ok);
        assert_eq!(result.missing_facts, vec![MISSING_NAME_FACT]);
        assert_eq!(result.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_ok_field_uses_heuristic() {
        let outcome = validator(vec![Ok(r#"{"missing_facts": []}"#)]).validate("no placeholder", "f").await;
        assert!(outcome.is_degraded());
        assert!(!outcome.value().ok);
    }

    #[tokio::test]
    async fn test_gateway_failure_uses_heuristic() {
        let outcome = validator(vec![Err("down")]).validate("Dear [NAME]", "f").await;
        assert!(matches!(outcome.reason(), Some(DegradeReason::Gateway(_))));
        assert!(outcome.value().ok);
    }
}
