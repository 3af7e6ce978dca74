use serde::{Deserialize, Serialize};

use super::hierarchical_type::HierarchicalType;

/// One directed relationship between two entities produced by the unified
/// KG extractor, before chunk mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    pub subject_text: String,
    pub subject_normalized: String,
    pub subject_type: HierarchicalType,
    pub predicate: String,
    pub object_text: String,
    pub object_normalized: String,
    pub object_type: HierarchicalType,
    pub confidence: f32,
    pub context: String,
}

/// Normalizes a raw predicate label to the closed snake_case vocabulary
/// shape: lowercase, spaces and hyphens collapsed to underscores.
pub fn normalize_predicate(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_spaces_and_case() {
        assert_eq!(normalize_predicate("Depends On"), "depends_on");
        assert_eq!(normalize_predicate("BUILT-WITH"), "built_with");
    }
}
