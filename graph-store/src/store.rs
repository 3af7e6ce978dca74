use async_trait::async_trait;

use crate::error::GraphError;
use crate::model::{
    ChunkSearchResult, CoOccurringEntity, DocumentStats, EnhancedSearchTraversal, EntityInput,
    EntitySearchResult,
};

/// How `search_chunks` resolves the entities whose chunks to return: by
/// graph `elementId`, or by `Entity.text`/`normalized` match.
#[derive(Debug, Clone)]
pub enum EntityLookup<'a> {
    Ids(&'a [String]),
    Names(&'a [String]),
}

/// Idempotent graph persistence, fronting the concrete Neo4j-backed
/// [`crate::GraphClient`] so callers (the pipeline orchestrator, the HTTP
/// handlers) depend on this trait object rather than the driver directly.
/// Every write below is a merge-by-key operation against the node or
/// relationship's canonical identifier.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Merges by `content_id`; sets `created_at` only on insert, always
    /// bumps `updated_at`. Returns the node's Neo4j `elementId`.
    async fn create_document(
        &self,
        content_id: i64,
        url: &str,
        title: &str,
    ) -> Result<String, GraphError>;

    /// Merges by `vector_rowid`; attaches `HAS_CHUNK` from the document.
    /// `text_preview` is truncated to 200 characters.
    async fn create_chunk(
        &self,
        document_id: &str,
        vector_rowid: i64,
        chunk_index: u32,
        char_start: usize,
        char_end: usize,
        text_preview: &str,
    ) -> Result<String, GraphError>;

    /// Merges by `normalized`. On insert sets `mention_count = 1` and
    /// `avg_confidence = confidence`; on match applies the running-average
    /// formula and increments `mention_count`.
    async fn create_entity(&self, input: EntityInput<'_>) -> Result<String, GraphError>;

    /// Merges the `MENTIONED_IN` edge between an entity and a chunk,
    /// overwriting its attributes with the latest mention's values.
    /// `context_before`/`context_after` are truncated to 100 characters,
    /// `sentence` to 500.
    #[allow(clippy::too_many_arguments)]
    async fn link_entity_to_chunk(
        &self,
        entity_id: &str,
        chunk_id: &str,
        offset_start: usize,
        offset_end: usize,
        confidence: f32,
        context_before: &str,
        context_after: &str,
        sentence: &str,
    ) -> Result<(), GraphError>;

    /// Merges by the `(subject, predicate, object)` triple; the edge label
    /// is the uppercased predicate. On insert initializes
    /// `occurrence_count = 1`; on match applies a running confidence
    /// average and increments `occurrence_count`. `context` is truncated
    /// to 500 characters. Rejects predicates containing characters other
    /// than ASCII letters, digits, and underscores rather than
    /// interpolating them unchecked into the relationship type.
    async fn create_relationship(
        &self,
        subject_normalized: &str,
        predicate: &str,
        object_normalized: &str,
        confidence: f32,
        context: &str,
    ) -> Result<(), GraphError>;

    /// Normalizes the entity pair by lexicographic order of `normalized`
    /// so only one `CO_OCCURS_WITH` edge ever exists per pair, increments
    /// `count`, and appends `chunk_rowid` to `chunk_rowids`. Not invoked by
    /// the default orchestrator but must remain correct.
    async fn update_co_occurrence(
        &self,
        entity1_normalized: &str,
        entity2_normalized: &str,
        chunk_rowid: i64,
    ) -> Result<(), GraphError>;

    /// Chunk/entity counts for one document, or `None` if no document with
    /// that `content_id` exists.
    async fn document_stats(&self, content_id: i64) -> Result<Option<DocumentStats>, GraphError>;

    /// `POST /api/v1/search/entities`: case-insensitive substring match of
    /// any `term` against `Entity.text` or `Entity.normalized`, filtered
    /// to `mention_count >= min_mentions`, deduplicated across terms,
    /// ordered by `mention_count` descending, truncated to `limit`.
    async fn search_entities(
        &self,
        terms: &[String],
        limit: usize,
        min_mentions: u64,
    ) -> Result<Vec<EntitySearchResult>, GraphError>;

    /// `POST /api/v1/search/chunks`: chunks mentioning any entity resolved
    /// by `lookup`, ordered by matched-entity count descending then
    /// `chunk_index` ascending.
    async fn search_chunks(&self, lookup: EntityLookup<'_>) -> Result<Vec<ChunkSearchResult>, GraphError>;

    /// `POST /api/v1/expand/entities`: entities co-occurring (sharing a
    /// chunk) with any of `entity_names`, one hop per `expansion_depth`
    /// iteration, with the relationship predicates (if any) connecting
    /// each to the original set. Confidence bucketing from the shared
    /// chunk count is the caller's responsibility (§6).
    async fn expand_entities(
        &self,
        entity_names: &[String],
        max_expansions: usize,
        expansion_depth: u8,
    ) -> Result<Vec<CoOccurringEntity>, GraphError>;

    /// The single traversal backing `POST /api/v1/search/enhanced` (§4.9):
    /// resolves `search_term_entities` by exact `text` match, then
    /// collects both the chunks they are mentioned in and the chunks
    /// mentioning entities that co-occur with them. Tiered scoring, dedup,
    /// and truncation to `max_chunks` happen downstream in the C9 scorer.
    async fn enhanced_search_traversal(
        &self,
        search_term_entities: &[String],
    ) -> Result<EnhancedSearchTraversal, GraphError>;

    async fn health_check(&self) -> bool;
}
