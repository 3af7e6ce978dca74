const WINDOW: usize = 50;
const SENTENCE_MAX: usize = 500;

/// `context_before`/`context_after`/`sentence` computed around one
/// character span, shared by the NER extractor (C2) and the unified KG
/// extractor (C3) so both code paths produce identically-shaped context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub context_before: String,
    pub context_after: String,
    pub sentence: String,
}

/// Computes a fixed 50-character window on either side of `[start, end)`
/// plus the enclosing sentence, found by scanning backward/forward for the
/// nearest `.`. `start`/`end` are character (not byte) offsets into `text`.
pub fn compute_context(text: &str, start: usize, end: usize) -> ContextWindow {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let start = start.min(len);
    let end = end.clamp(start, len);

    let before_start = start.saturating_sub(WINDOW);
    let context_before: String = chars[before_start..start].iter().collect();

    let after_end = (end + WINDOW).min(len);
    let context_after: String = chars[end..after_end].iter().collect();

    let sentence_start = chars[..start]
        .iter()
        .rposition(|&c| c == '.')
        .map_or(0, |pos| pos + 1);

    let sentence_end = chars[end..]
        .iter()
        .position(|&c| c == '.')
        .map_or(len, |pos| end + pos + 1);

    let mut sentence: String = chars[sentence_start..sentence_end].iter().collect();
    let sentence = sentence.trim().to_string();
    let sentence = if sentence.chars().count() > SENTENCE_MAX {
        sentence.chars().take(SENTENCE_MAX).collect()
    } else {
        sentence
    };

    ContextWindow {
        context_before,
        context_after,
        sentence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_sentence_and_windows() {
        let text = "Rust is fast. Neo4j stores graphs. Python is popular.";
        let start = text.find("Neo4j").unwrap();
        let end = start + "Neo4j".len();
        let window = compute_context(text, start, end);
        assert_eq!(window.sentence, "Neo4j stores graphs.");
        assert!(window.context_before.ends_with("fast. "));
    }

    #[test]
    fn handles_span_at_document_start() {
        let text = "Neo4j stores graphs.";
        let window = compute_context(text, 0, 5);
        assert_eq!(window.context_before, "");
        assert_eq!(window.sentence, "Neo4j stores graphs.");
    }

    #[test]
    fn handles_span_at_document_end_with_no_trailing_period() {
        let text = "Intro. Neo4j stores graphs";
        let end = text.len();
        let window = compute_context(text, "Intro. ".len(), end);
        assert_eq!(window.sentence, "Neo4j stores graphs");
    }
}
