use serde::{Deserialize, Serialize};

use super::hierarchical_type::HierarchicalType;

/// One entity occurrence as produced by an extractor (NER or unified KG),
/// before chunk mapping. `start`/`end` are character offsets into the
/// document text that was extracted from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub text: String,
    pub normalized: String,
    #[serde(flatten)]
    pub entity_type: HierarchicalType,
    pub confidence: f32,
    pub start: usize,
    pub end: usize,
    pub context_before: String,
    pub context_after: String,
    pub sentence: String,
}

impl ExtractedEntity {
    pub fn normalize(text: &str) -> String {
        text.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_trims() {
        assert_eq!(ExtractedEntity::normalize("  Neo4j  "), "neo4j");
    }
}
