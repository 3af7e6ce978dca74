use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::chunk::{ChunkAppearance, ChunkInput};
use super::hierarchical_type::HierarchicalType;

/// Body of `POST /api/v1/ingest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub content_id: u64,
    pub url: String,
    pub title: String,
    pub markdown: String,
    pub chunks: Vec<ChunkInput>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// A persisted entity as returned from `/api/v1/ingest`: the hierarchical
/// type, confidence, context triple, and every chunk it was mapped into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityResult {
    pub text: String,
    pub normalized: String,
    #[serde(flatten)]
    pub entity_type: HierarchicalType,
    pub confidence: f32,
    pub context_before: String,
    pub context_after: String,
    pub sentence: String,
    pub chunk_appearances: Vec<ChunkAppearance>,
    pub spans_multiple_chunks: bool,
}

/// A reference to an entity by identity, embedded in relationship results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    pub text: String,
    pub normalized: String,
    pub type_full: String,
}

/// A persisted relationship as returned from `/api/v1/ingest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipResult {
    pub subject: EntityRef,
    pub predicate: String,
    pub object: EntityRef,
    pub confidence: f32,
    pub context: String,
    pub spans_chunks: bool,
    pub chunk_rowids: Vec<u64>,
}

/// Aggregate statistics over one ingested document's extraction result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestSummary {
    pub entities_by_type: HashMap<String, u64>,
    pub relationships_by_predicate: HashMap<String, u64>,
    pub chunks_with_entities: u64,
    pub mean_entities_per_chunk: f64,
}

/// Body returned from `POST /api/v1/ingest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub content_id: u64,
    pub neo4j_document_id: String,
    pub entities_extracted: usize,
    pub relationships_extracted: usize,
    pub processing_time_ms: u64,
    pub entities: Vec<EntityResult>,
    pub relationships: Vec<RelationshipResult>,
    pub summary: IngestSummary,
}
