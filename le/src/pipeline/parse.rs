//! Lenient extraction of structured answers from model text

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// A list that models sometimes send as a comma separated string
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    List(Vec<String>),
    Text(String),
    #[default]
    Missing,
}

impl StringList {
    /// Trimmed, non-empty entries in order
    pub fn into_items(self) -> Vec<String> {
        let raw = match self {
            StringList::List(items) => items,
            StringList::Text(text) => text.split([',', ';', '\n']).map(str::to_string).collect(),
            StringList::Missing => Vec::new(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// The JSON object inside a response, tolerating code fences and chatter
/// around it
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the JSON object embedded in `text`
pub fn parse_embedded<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let object = extract_json_object(text).ok_or_else(|| "no JSON object in response".to_string())?;
    serde_json::from_str(object).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        ok: bool,
    }

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json_object("{\"ok\": true}"), Some("{\"ok\": true}"));
    }

    #[test]
    fn test_extract_from_fenced_block() {
        let text = "Here you go:\n```json\n{\"ok\": false}\n```\nThanks";
        assert_eq!(parse_embedded::<Verdict>(text).unwrap(), Verdict { ok: false });
    }

    #[test]
    fn test_no_object() {
        assert!(extract_json_object("no braces here").is_none());
        assert!(extract_json_object("} backwards {").is_none());
        assert!(parse_embedded::<Verdict>("plain text").is_err());
    }

    #[test]
    fn test_malformed_object() {
        assert!(parse_embedded::<Verdict>("{ok: yes}").is_err());
    }

    #[test]
    fn test_string_list_shapes() {
        let list: StringList = serde_json::from_str(r#"["a", " b ", ""]"#).unwrap();
        assert_eq!(list.into_items(), vec!["a", "b"]);

        let text: StringList = serde_json::from_str(r#""utility_cut, non_payment""#).unwrap();
        assert_eq!(text.into_items(), vec!["utility_cut", "non_payment"]);

        assert!(StringList::default().into_items().is_empty());
    }
}
