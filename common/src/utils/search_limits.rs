use crate::domain::{ChunkSearchRequest, EnhancedSearchRequest, EntitySearchRequest, ExpandEntitiesRequest};

/// Mirrors [`crate::utils::ingest_limits::IngestValidationError`]: every
/// variant maps to HTTP 422 at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchValidationError(pub String);

impl std::fmt::Display for SearchValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

const ENTITY_SEARCH_LIMIT_MAX: usize = 500;
const MAX_CHUNKS_MAX: usize = 500;
const MAX_EXPANSIONS_MAX: usize = 100;

fn invalid(msg: impl Into<String>) -> SearchValidationError {
    SearchValidationError(msg.into())
}

/// `POST /api/v1/search/entities` (§6): `entity_terms` non-empty,
/// `limit <= 500`, `min_mentions >= 1`.
pub fn validate_entity_search_request(request: &EntitySearchRequest) -> Result<(), SearchValidationError> {
    if request.entity_terms.is_empty() {
        return Err(invalid("entity_terms must contain at least one term"));
    }
    if request.limit == 0 || request.limit > ENTITY_SEARCH_LIMIT_MAX {
        return Err(invalid(format!("limit must be between 1 and {ENTITY_SEARCH_LIMIT_MAX}")));
    }
    if request.min_mentions == 0 {
        return Err(invalid("min_mentions must be at least 1"));
    }
    Ok(())
}

/// `POST /api/v1/search/chunks` (§6): exactly one of `entity_ids` or
/// `entity_names` must be non-empty.
pub fn validate_chunk_search_request(request: &ChunkSearchRequest) -> Result<(), SearchValidationError> {
    let has_ids = !request.entity_ids.is_empty();
    let has_names = !request.entity_names.is_empty();
    if has_ids == has_names {
        return Err(invalid("exactly one of entity_ids or entity_names must be provided"));
    }
    Ok(())
}

/// `POST /api/v1/expand/entities` (§6): `entity_names` non-empty,
/// `max_expansions <= 100`, `min_confidence` in `[0, 1]`, `expansion_depth`
/// in `1..=3`.
pub fn validate_expand_entities_request(request: &ExpandEntitiesRequest) -> Result<(), SearchValidationError> {
    if request.entity_names.is_empty() {
        return Err(invalid("entity_names must contain at least one name"));
    }
    if request.max_expansions == 0 || request.max_expansions > MAX_EXPANSIONS_MAX {
        return Err(invalid(format!("max_expansions must be between 1 and {MAX_EXPANSIONS_MAX}")));
    }
    if !(0.0..=1.0).contains(&request.min_confidence) {
        return Err(invalid("min_confidence must be between 0 and 1"));
    }
    if !(1..=3).contains(&request.expansion_depth) {
        return Err(invalid("expansion_depth must be between 1 and 3"));
    }
    Ok(())
}

/// `POST /api/v1/search/enhanced` (§4.9/§6): `max_chunks <= 500`.
pub fn validate_enhanced_search_request(request: &EnhancedSearchRequest) -> Result<(), SearchValidationError> {
    if request.max_chunks == 0 || request.max_chunks > MAX_CHUNKS_MAX {
        return Err(invalid(format!("max_chunks must be between 1 and {MAX_CHUNKS_MAX}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_entity_terms() {
        let request = EntitySearchRequest { entity_terms: vec![], limit: 10, min_mentions: 1 };
        assert!(validate_entity_search_request(&request).is_err());
    }

    #[test]
    fn rejects_limit_over_500() {
        let request = EntitySearchRequest { entity_terms: vec!["x".into()], limit: 501, min_mentions: 1 };
        assert!(validate_entity_search_request(&request).is_err());
    }

    #[test]
    fn chunk_search_rejects_both_ids_and_names() {
        let request = ChunkSearchRequest {
            entity_ids: vec!["id1".into()],
            entity_names: vec!["name1".into()],
            include_document_info: false,
        };
        assert!(validate_chunk_search_request(&request).is_err());
    }

    #[test]
    fn chunk_search_rejects_neither_ids_nor_names() {
        assert!(validate_chunk_search_request(&ChunkSearchRequest::default()).is_err());
    }

    #[test]
    fn chunk_search_accepts_names_only() {
        let request = ChunkSearchRequest {
            entity_ids: vec![],
            entity_names: vec!["neo4j".into()],
            include_document_info: true,
        };
        assert!(validate_chunk_search_request(&request).is_ok());
    }

    #[test]
    fn expand_entities_rejects_out_of_range_expansion_depth() {
        let request = ExpandEntitiesRequest {
            entity_names: vec!["neo4j".into()],
            max_expansions: 10,
            min_confidence: 0.5,
            expansion_depth: 4,
        };
        assert!(validate_expand_entities_request(&request).is_err());
    }

    #[test]
    fn enhanced_search_rejects_max_chunks_over_500() {
        let request = EnhancedSearchRequest {
            query: "q".into(),
            search_term_entities: vec![],
            max_chunks: 501,
        };
        assert!(validate_enhanced_search_request(&request).is_err());
    }
}
