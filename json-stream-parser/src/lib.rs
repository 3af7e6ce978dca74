//! Deterministic repair of truncated or loosely-wrapped JSON produced by a
//! large language model. Given raw completion text that is supposed to be
//! a single JSON object but may be wrapped in prose, fenced in Markdown, or
//! cut off mid-structure by a token limit, [`heal`] returns a
//! [`serde_json::Value`] that always parses, falling back to an empty
//! document rather than propagating a parse error.
//!
//! The pipeline has no I/O and depends on nothing but `serde_json` and
//! `regex`, so it is exercised here against a fixture corpus of malformed
//! responses without a live model.

use regex::Regex;
use serde_json::Value;

const MAX_PEEL_ITERATIONS: usize = 10;

fn empty_document() -> Value {
    serde_json::json!({"entities": [], "relationships": []})
}

/// Strips Markdown fences and surrounding prose until the text starts with
/// `{` and ends with `}`, or gives up after [`MAX_PEEL_ITERATIONS`].
fn peel_wrappers(raw: &str) -> String {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("static regex is valid");
    let mut text = raw.trim().to_string();

    for _ in 0..MAX_PEEL_ITERATIONS {
        if text.starts_with('{') && text.ends_with('}') {
            return text;
        }

        if let Some(caps) = fence.captures(&text) {
            text = caps[1].to_string();
            continue;
        }

        let start = text.find('{');
        let end = text.rfind('}');
        if let (Some(start), Some(end)) = (start, end) {
            if end > start {
                text = text[start..=end].to_string();
                continue;
            }
        }

        break;
    }

    text
}

/// Repairs an object/array-brace imbalance by truncating to the last
/// complete sub-structure and appending the minimum closing brackets/braces
/// needed to balance counts. Falls back to the empty document if the
/// result is still unbalanced or no closing delimiter was ever found.
fn heal_truncation(text: &str) -> String {
    let Some(start_idx) = text.find('{') else {
        return empty_document().to_string();
    };

    let open_braces = text.matches('{').count();
    let close_braces = text.matches('}').count();
    let open_brackets = text.matches('[').count();
    let close_brackets = text.matches(']').count();

    if text.trim_end().ends_with('}') && open_braces == close_braces && open_brackets == close_brackets {
        return text.to_string();
    }

    let last_complete_idx = text
        .char_indices()
        .rev()
        .take_while(|(i, _)| *i > start_idx)
        .find(|(_, c)| *c == '}' || *c == ']')
        .map(|(i, _)| i);

    let Some(last_complete_idx) = last_complete_idx else {
        return empty_document().to_string();
    };

    let mut healed = text[..=last_complete_idx].to_string();

    let open_brackets = healed.matches('[').count();
    let close_brackets = healed.matches(']').count();
    if open_brackets > close_brackets {
        for _ in 0..(open_brackets - close_brackets) {
            healed.push_str("\n  ]");
        }
    }

    let open_braces = healed.matches('{').count();
    let close_braces = healed.matches('}').count();
    if open_braces > close_braces {
        for _ in 0..(open_braces - close_braces) {
            healed.push('}');
        }
    }

    let final_open_braces = healed.matches('{').count();
    let final_close_braces = healed.matches('}').count();
    let final_open_brackets = healed.matches('[').count();
    let final_close_brackets = healed.matches(']').count();

    if final_open_braces != final_close_braces || final_open_brackets != final_close_brackets {
        return empty_document().to_string();
    }

    healed
}

/// Repairs malformed escape sequences over up to three passes: first
/// widens truncated `\uXXXX` escapes into a double backslash (so they at
/// least parse as a literal `\u...` string rather than failing), then
/// protects every valid JSON escape behind a unique placeholder, escapes
/// any remaining lone backslash, and restores the placeholders. Stops
/// early once a pass produces no change.
fn sanitize_escapes(text: &str) -> String {
    let truncated_unicode =
        Regex::new(r"\\u([0-9a-fA-F]{0,3})([^0-9a-fA-F]|$)").expect("static regex is valid");
    let valid_unicode = Regex::new(r"\\u([0-9a-fA-F]{4})").expect("static regex is valid");
    let placeholder_unicode = Regex::new(r"___UNICODE([0-9a-fA-F]{4})___").expect("static regex is valid");

    let mut current = text.to_string();

    for _ in 0..3 {
        let before = current.clone();

        current = truncated_unicode
            .replace_all(&current, r"\\u$1$2")
            .to_string();

        let mut protected = current.clone();
        protected = protected.replace("\\\"", "___QUOTE___");
        protected = protected.replace("\\\\", "___BACKSLASH___");
        protected = protected.replace("\\/", "___SLASH___");
        protected = protected.replace("\\b", "___BACKSPACE___");
        protected = protected.replace("\\f", "___FORMFEED___");
        protected = protected.replace("\\n", "___NEWLINE___");
        protected = protected.replace("\\r", "___RETURN___");
        protected = protected.replace("\\t", "___TAB___");
        protected = valid_unicode
            .replace_all(&protected, "___UNICODE$1___")
            .to_string();

        protected = protected.replace('\\', "\\\\");

        protected = protected.replace("___QUOTE___", "\\\"");
        protected = protected.replace("___BACKSLASH___", "\\\\");
        protected = protected.replace("___SLASH___", "\\/");
        protected = protected.replace("___BACKSPACE___", "\\b");
        protected = protected.replace("___FORMFEED___", "\\f");
        protected = protected.replace("___NEWLINE___", "\\n");
        protected = protected.replace("___RETURN___", "\\r");
        protected = protected.replace("___TAB___", "\\t");
        protected = placeholder_unicode
            .replace_all(&protected, "\\u$1")
            .to_string();

        current = protected;

        if current == before {
            break;
        }
    }

    current
}

/// Runs the full peel/heal/sanitize/parse pipeline over raw LLM output,
/// returning `{"entities": [], "relationships": []}` rather than an error
/// when the text still cannot be parsed as a JSON object after repair.
pub fn heal(raw: &str) -> Value {
    let peeled = peel_wrappers(raw);
    let healed = heal_truncation(&peeled);
    let sanitized = sanitize_escapes(&healed);

    match serde_json::from_str::<Value>(&sanitized) {
        Ok(Value::Object(map)) => Value::Object(map),
        _ => empty_document(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_already_clean_json() {
        let raw = r#"{"entities": [], "relationships": []}"#;
        assert_eq!(heal(raw), serde_json::json!({"entities": [], "relationships": []}));
    }

    #[test]
    fn strips_markdown_fence() {
        let raw = "```json\n{\"entities\": [], \"relationships\": []}\n```";
        assert_eq!(heal(raw), serde_json::json!({"entities": [], "relationships": []}));
    }

    #[test]
    fn strips_leading_and_trailing_prose() {
        let raw = "Sure, here is the result:\n{\"entities\": [], \"relationships\": []}\nLet me know if you need more.";
        assert_eq!(heal(raw), serde_json::json!({"entities": [], "relationships": []}));
    }

    #[test]
    fn heals_truncated_mid_object() {
        let raw = r#"{"entities": [{"text": "Neo4j", "type": "Database", "confidence": 0.9, "start": 0, "end": 5}], "relationships": [{"subject": "Neo4j", "predicate": "uses"#;
        let healed = heal(raw);
        assert!(healed.is_object());
        assert_eq!(healed["entities"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn heals_truncated_mid_array() {
        let raw = r#"{"entities": [{"text": "Neo4j", "type": "Database", "confidence": 0.9, "start": 0, "end": 5}, {"text": "Python""#;
        let healed = heal(raw);
        assert!(healed.is_object());
        assert!(healed["entities"].is_array());
    }

    #[test]
    fn falls_back_to_empty_document_when_nothing_complete_survives() {
        let raw = "{\"entities\": [{\"text\": \"a";
        assert_eq!(heal(raw), serde_json::json!({"entities": [], "relationships": []}));
    }

    #[test]
    fn falls_back_to_empty_document_with_no_brace_at_all() {
        let raw = "I could not extract any entities from this text.";
        assert_eq!(heal(raw), serde_json::json!({"entities": [], "relationships": []}));
    }

    #[test]
    fn sanitizes_truncated_unicode_escape() {
        let raw = r#"{"entities": [], "relationships": [], "note": "bad \u12"}"#;
        let healed = heal(raw);
        assert!(healed.is_object());
    }

    #[test]
    fn sanitizes_raw_control_backslash() {
        let raw = r#"{"entities": [], "relationships": [], "note": "path C:\Users\x"}"#;
        let healed = heal(raw);
        assert!(healed.is_object());
    }

    #[test]
    fn preserves_valid_escapes_through_sanitization() {
        let raw = r#"{"entities": [], "relationships": [], "note": "line one\nline two"}"#;
        let healed = heal(raw);
        assert_eq!(healed["note"], "line one\nline two");
    }

    #[test]
    fn tolerates_dangling_comma_by_healing_to_last_complete_element() {
        let raw = r#"{"entities": [{"text": "Neo4j", "type": "Database", "confidence": 0.9, "start": 0, "end": 5},"#;
        let healed = heal(raw);
        assert!(healed.is_object());
        assert_eq!(healed["entities"].as_array().unwrap().len(), 1);
    }
}
