//! Coerce free-form model text into a JSON object.
//!
//! Models drift in formatting: fenced code blocks, a conversational line
//! before the payload, or a top-level array instead of an object. A failed
//! coercion is an expected outcome and yields `None`, never an error.

use serde_json::{Map, Value};

const FENCE: &str = "```";

/// Content of the first fenced block, without its language hint.
/// `None` when the text has no complete fenced block.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE)? + FENCE.len();
    let rest = &text[start..];
    let end = rest.find(FENCE)?;
    let inner = &rest[..end];

    let hint_len = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(inner.len());
    Some(inner[hint_len..].trim())
}

/// Extract a JSON object from `raw`, or `None` if there isn't one.
pub fn coerce(raw: &str) -> Option<Map<String, Value>> {
    let mut text = raw.trim();
    if let Some(inner) = fenced_block(text) {
        text = inner;
    }
    if !text.starts_with('{') {
        if let Some(brace) = text.find('{') {
            text = &text[brace..];
        }
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object() {
        let map = coerce(r#"  {"verdict": "mixed", "score": 3}  "#).unwrap();
        assert_eq!(map["verdict"], "mixed");
        assert_eq!(map["score"], 3);
    }

    #[test]
    fn fenced_block_with_language_tag() {
        let raw = "Here is the analysis:\n```json\n{\"overall_sentiment\": {\"score\": 2}}\n```\nLet me know!";
        let map = coerce(raw).unwrap();
        assert_eq!(map["overall_sentiment"]["score"], 2);
    }

    #[test]
    fn fenced_block_without_tag() {
        let map = coerce("```\n{\"a\": 1}\n```").unwrap();
        assert_eq!(map["a"], 1);
    }

    #[test]
    fn only_first_fenced_block_is_used() {
        let raw = "```json\n{\"first\": true}\n```\n```json\n{\"second\": true}\n```";
        let map = coerce(raw).unwrap();
        assert!(map.contains_key("first"));
        assert!(!map.contains_key("second"));
    }

    #[test]
    fn preamble_before_brace() {
        let map = coerce("Sure! Based on the data, {\"verdict\": \"bullish\"}").unwrap();
        assert_eq!(map["verdict"], "bullish");
    }

    #[test]
    fn top_level_list_is_rejected() {
        assert!(coerce("[1, 2, 3]").is_none());
        assert!(coerce("```json\n[{\"a\": 1}]\n```").is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(coerce("I cannot analyze this ticker.").is_none());
        assert!(coerce("").is_none());
        assert!(coerce("{\"unterminated\": ").is_none());
        assert!(coerce("{\"a\": 1} and some trailing words").is_none());
    }

    #[test]
    fn unclosed_fence_falls_back_to_brace_scan() {
        let map = coerce("```json\n{\"a\": 1}").unwrap();
        assert_eq!(map["a"], 1);
    }
}
