use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/search/entities` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySearchRequest {
    pub entity_terms: Vec<String>,
    #[serde(default = "default_entity_search_limit")]
    pub limit: usize,
    #[serde(default = "default_min_mentions")]
    pub min_mentions: u64,
}

fn default_entity_search_limit() -> usize {
    100
}

fn default_min_mentions() -> u64 {
    1
}

/// Body of `POST /api/v1/search/chunks` (§6): exactly one of `entity_ids`
/// or `entity_names` must be provided.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkSearchRequest {
    #[serde(default)]
    pub entity_ids: Vec<String>,
    #[serde(default)]
    pub entity_names: Vec<String>,
    #[serde(default)]
    pub include_document_info: bool,
}

/// Body of `POST /api/v1/expand/entities` (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandEntitiesRequest {
    pub entity_names: Vec<String>,
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default = "default_expansion_depth")]
    pub expansion_depth: u8,
}

fn default_max_expansions() -> usize {
    25
}

fn default_min_confidence() -> f32 {
    0.0
}

fn default_expansion_depth() -> u8 {
    1
}

/// Body of `POST /api/v1/search/enhanced` (§4.9/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedSearchRequest {
    pub query: String,
    pub search_term_entities: Vec<String>,
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,
}

fn default_max_chunks() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_search_request_defaults_limit_and_min_mentions() {
        let parsed: EntitySearchRequest =
            serde_json::from_str(r#"{"entity_terms": ["neo4j"]}"#).unwrap();
        assert_eq!(parsed.limit, 100);
        assert_eq!(parsed.min_mentions, 1);
    }

    #[test]
    fn enhanced_search_request_defaults_max_chunks() {
        let parsed: EnhancedSearchRequest =
            serde_json::from_str(r#"{"query": "q", "search_term_entities": []}"#).unwrap();
        assert_eq!(parsed.max_chunks, 50);
    }
}
