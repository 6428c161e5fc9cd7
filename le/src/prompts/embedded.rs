//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

pub const CLASSIFY: &str = include_str!("../../prompts/classify.pmt");

pub const DRAFT: &str = include_str!("../../prompts/draft.pmt");

pub const VALIDATE: &str = include_str!("../../prompts/validate.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "classify" => Some(CLASSIFY),
        "draft" => Some(DRAFT),
        "validate" => Some(VALIDATE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_embedded_classify() {
        let classify = get_embedded("classify").unwrap();
        assert!(classify.contains("landlord_tenant"));
        assert!(classify.contains("short_summary"));
        assert!(classify.contains("{{text}}"));
    }

    #[test]
    fn test_get_embedded_draft_mentions_sentinel() {
        let draft = get_embedded("draft").unwrap();
        assert!(draft.contains("{{sentinel}}"));
        assert!(draft.contains("[NAME]"));
    }

    #[test]
    fn test_get_embedded_validate() {
        let validate = get_embedded("validate").unwrap();
        assert!(validate.contains("missing_facts"));
        assert!(validate.contains("{{draft}}"));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
