use common::domain::HierarchicalType;

#[derive(Debug, Clone)]
pub struct DocumentStats {
    pub node_id: String,
    pub url: String,
    pub title: String,
    pub chunk_count: i64,
    pub entity_count: i64,
}

/// Everything [`crate::GraphStore::create_entity`] needs, bundled so the
/// trait signature does not grow a new positional argument every time the
/// hierarchical type gains a field.
#[derive(Debug, Clone)]
pub struct EntityInput<'a> {
    pub text: &'a str,
    pub normalized: &'a str,
    pub entity_type: &'a HierarchicalType,
    pub confidence: f32,
}

/// One row of `POST /api/v1/search/entities`.
#[derive(Debug, Clone)]
pub struct EntitySearchResult {
    pub text: String,
    pub normalized: String,
    pub type_full: String,
    pub mention_count: i64,
    pub avg_confidence: f32,
}

/// One row of `POST /api/v1/search/chunks`.
#[derive(Debug, Clone)]
pub struct ChunkSearchResult {
    pub vector_rowid: i64,
    pub chunk_index: i64,
    pub text_preview: String,
    pub matched_entity_count: i64,
    pub document_url: Option<String>,
    pub document_title: Option<String>,
}

/// One row of `POST /api/v1/expand/entities`, before confidence bucketing
/// (done by the caller, since the bucket thresholds are an API-surface
/// concern rather than a graph-store one).
#[derive(Debug, Clone)]
pub struct CoOccurringEntity {
    pub text: String,
    pub normalized: String,
    pub type_full: String,
    pub shared_chunk_count: i64,
    pub relationship_predicates: Vec<String>,
}

/// One chunk that mentions at least one resolved search-term entity,
/// together with which resolved entities (by `normalized`) it mentions.
/// Raw input to C9's tiered scoring (§4.9 steps 1-2).
#[derive(Debug, Clone)]
pub struct ResolvedChunkRow {
    pub vector_rowid: i64,
    pub chunk_index: i64,
    pub text_preview: String,
    pub resolved_entities: Vec<String>,
}

/// One chunk that mentions at least one co-occurring entity (an entity
/// found alongside a resolved entity elsewhere, but not itself a resolved
/// search term). Raw input to C9's tiered scoring (§4.9 steps 3 and 5).
#[derive(Debug, Clone)]
pub struct ExpansionChunkRow {
    pub vector_rowid: i64,
    pub chunk_index: i64,
    pub text_preview: String,
    pub co_occurring_entities: Vec<String>,
}

/// The raw traversal result for `POST /api/v1/search/enhanced` (§4.9):
/// one graph query's worth of resolved-entity chunks and expansion
/// chunks, handed to the C9 scorer for tiering, dedup, and truncation.
#[derive(Debug, Clone, Default)]
pub struct EnhancedSearchTraversal {
    pub resolved_entity_count: usize,
    pub resolved_chunks: Vec<ResolvedChunkRow>,
    pub expansion_chunks: Vec<ExpansionChunkRow>,
}
