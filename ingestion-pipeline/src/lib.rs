//! Pipeline orchestrator (C7): drives the NER/unified extraction branch,
//! the chunk mapper (C4), and idempotent graph persistence (C5) for one
//! document, then assembles the `IngestResponse`.

mod stats;

pub use stats::{PipelineStats, PipelineStatsSnapshot};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chunk_mapper::{map_entity_to_chunks, map_relationship_to_chunks, ChunkBoundary, EntityChunkMapping};
use common::domain::{
    ChunkAppearance, ChunkInput, EntityRef, EntityResult, ExtractedEntity, IngestResponse,
    IngestSummary, RelationshipResult,
};
use common::error::AppError;
use graph_store::{EntityInput, GraphError, GraphStore};
use kg_extractor::UnifiedExtractor;
use ner_client::NerClient;
use tokio::sync::OnceCell;

/// Maps a graph-store failure onto the error taxonomy (§7): the driver
/// being unreachable (Neo4j down) is `ServiceUnavailable`, the same
/// externally-observable condition `/health` reports and the search
/// routes already surface as 503 — not a bug in this service, so it must
/// not collapse into `Processing`/500 the way an internal fault should.
fn graph_write_error(stage: &str, err: GraphError) -> AppError {
    match err {
        GraphError::Driver(err) => AppError::Neo4j(err),
        other => AppError::Processing(format!("failed to {stage}: {other}")),
    }
}

/// One-shot schema setup, abstracted behind a trait so the orchestrator
/// does not depend on the Neo4j driver directly — the real binary wires a
/// [`graph_store::SchemaManager`]-backed implementation; tests use
/// [`NoopSchemaInitializer`] against a [`graph_store::FakeGraphStore`].
#[async_trait]
pub trait SchemaInitializer: Send + Sync {
    async fn ensure_initialized(&self);
}

/// No-op initializer for test doubles that have no schema to create.
pub struct NoopSchemaInitializer;

#[async_trait]
impl SchemaInitializer for NoopSchemaInitializer {
    async fn ensure_initialized(&self) {}
}

/// Which entity source feeds relationship extraction: the NER model's
/// hierarchical spans, or the unified LLM pass's own entity list.
enum ExtractionPath {
    Ner,
    Unified,
}

pub struct PipelineOrchestrator {
    graph: Arc<dyn GraphStore>,
    schema: Arc<dyn SchemaInitializer>,
    schema_ready: OnceCell<()>,
    extractor: Arc<UnifiedExtractor>,
    ner: Option<Arc<NerClient>>,
    path: ExtractionPath,
    entity_min_confidence: f32,
    stats: PipelineStats,
}

impl PipelineOrchestrator {
    pub fn new(
        graph: Arc<dyn GraphStore>,
        schema: Arc<dyn SchemaInitializer>,
        extractor: Arc<UnifiedExtractor>,
        ner: Option<Arc<NerClient>>,
        use_ner_entities: bool,
        entity_min_confidence: f32,
    ) -> Self {
        let path = if use_ner_entities && ner.is_some() {
            ExtractionPath::Ner
        } else {
            ExtractionPath::Unified
        };
        Self {
            graph,
            schema,
            schema_ready: OnceCell::new(),
            extractor,
            ner,
            path,
            entity_min_confidence,
            stats: PipelineStats::default(),
        }
    }

    pub fn stats(&self) -> PipelineStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn extractor(&self) -> &Arc<UnifiedExtractor> {
        &self.extractor
    }

    pub fn ner(&self) -> Option<&Arc<NerClient>> {
        self.ner.as_ref()
    }

    /// Runs extraction → chunk mapping → persistence for one document
    /// (§4.7). The caller is responsible for validating the request first
    /// (`common::utils::ingest_limits::validate_ingest_request`); this
    /// function assumes the chunk list is well-formed.
    pub async fn process_document(
        &self,
        content_id: u64,
        url: &str,
        title: &str,
        markdown: &str,
        chunks: &[ChunkInput],
    ) -> Result<IngestResponse, AppError> {
        let result = self.process_document_inner(content_id, url, title, markdown, chunks).await;
        match &result {
            Ok(response) => self.stats.record_success(
                response.entities_extracted as u64,
                response.relationships_extracted as u64,
                response.processing_time_ms,
            ),
            Err(_) => self.stats.record_failure(),
        }
        result
    }

    async fn process_document_inner(
        &self,
        content_id: u64,
        url: &str,
        title: &str,
        markdown: &str,
        chunks: &[ChunkInput],
    ) -> Result<IngestResponse, AppError> {
        let started = Instant::now();

        self.schema_ready
            .get_or_init(|| async {
                self.schema.ensure_initialized().await;
            })
            .await;

        let (entities, relationships) = match self.path {
            ExtractionPath::Ner => {
                let ner = self.ner.as_ref().expect("ExtractionPath::Ner implies ner is Some");
                let entities = match ner.extract(markdown, Some(self.entity_min_confidence)).await {
                    Ok(entities) => entities,
                    Err(err) => {
                        tracing::warn!(error = %err, "NER extraction failed, continuing with no entities");
                        Vec::new()
                    }
                };
                let relationships = self.extractor.extract_relationships(markdown, &entities).await;
                (entities, relationships)
            }
            ExtractionPath::Unified => self.extractor.extract_kg(markdown).await,
        };

        let boundaries: Vec<ChunkBoundary> = chunks
            .iter()
            .map(|c| ChunkBoundary {
                vector_rowid: c.vector_rowid as i64,
                chunk_index: c.chunk_index as u32,
                char_start: c.char_start,
                char_end: c.char_end,
            })
            .collect();

        let entity_groups = group_entities(entities);
        let mut entity_mappings: HashMap<String, EntityChunkMapping> = HashMap::new();
        for (normalized, group) in &entity_groups {
            let occurrences: Vec<(usize, usize)> = group.iter().map(|e| (e.start, e.end)).collect();
            entity_mappings.insert(normalized.clone(), map_entity_to_chunks(&occurrences, &boundaries));
        }

        let document_node_id = self
            .graph
            .create_document(content_id as i64, url, title)
            .await
            .map_err(|err| graph_write_error("persist document", err))?;

        let mut chunk_node_ids: HashMap<i64, String> = HashMap::new();
        for chunk in chunks {
            let node_id = self
                .graph
                .create_chunk(
                    &document_node_id,
                    chunk.vector_rowid as i64,
                    chunk.chunk_index as u32,
                    chunk.char_start,
                    chunk.char_end,
                    &chunk.text_preview(),
                )
                .await
                .map_err(|err| graph_write_error("persist chunk", err))?;
            chunk_node_ids.insert(chunk.vector_rowid as i64, node_id);
        }

        let mut entity_results = Vec::with_capacity(entity_groups.len());
        let mut entities_by_type: HashMap<String, u64> = HashMap::new();

        for (normalized, group) in &entity_groups {
            let representative = group.first().expect("group is never empty");
            let confidence = mean_confidence(group);
            let mapping = entity_mappings.get(normalized).cloned().unwrap_or(EntityChunkMapping {
                chunk_appearances: Vec::new(),
                spans_multiple_chunks: false,
            });

            let entity_id = self
                .graph
                .create_entity(EntityInput {
                    text: &representative.text,
                    normalized,
                    entity_type: &representative.entity_type,
                    confidence,
                })
                .await
                .map_err(|err| graph_write_error("persist entity", err))?;

            for appearance in &mapping.chunk_appearances {
                if let Some(chunk_id) = chunk_node_ids.get(&appearance.vector_rowid) {
                    self.graph
                        .link_entity_to_chunk(
                            &entity_id,
                            chunk_id,
                            appearance.offset_start,
                            appearance.offset_end,
                            confidence,
                            &representative.context_before,
                            &representative.context_after,
                            &representative.sentence,
                        )
                        .await
                        .map_err(|err| graph_write_error("link entity to chunk", err))?;
                }
            }

            *entities_by_type.entry(representative.entity_type.type_full.clone()).or_insert(0) += 1;

            entity_results.push(EntityResult {
                text: representative.text.clone(),
                normalized: normalized.clone(),
                entity_type: representative.entity_type.clone(),
                confidence,
                context_before: representative.context_before.clone(),
                context_after: representative.context_after.clone(),
                sentence: representative.sentence.clone(),
                chunk_appearances: mapping
                    .chunk_appearances
                    .iter()
                    .map(|a| ChunkAppearance {
                        vector_rowid: a.vector_rowid as u64,
                        chunk_index: a.chunk_index as u64,
                        offset_start: a.offset_start,
                        offset_end: a.offset_end,
                    })
                    .collect(),
                spans_multiple_chunks: mapping.spans_multiple_chunks,
            });
        }

        let mut relationship_results = Vec::with_capacity(relationships.len());
        let mut relationships_by_predicate: HashMap<String, u64> = HashMap::new();
        let empty_mapping = EntityChunkMapping { chunk_appearances: Vec::new(), spans_multiple_chunks: false };

        for relationship in &relationships {
            let subject_mapping = entity_mappings.get(&relationship.subject_normalized).unwrap_or(&empty_mapping);
            let object_mapping = entity_mappings.get(&relationship.object_normalized).unwrap_or(&empty_mapping);
            let relationship_mapping = map_relationship_to_chunks(subject_mapping, object_mapping, &boundaries);

            self.graph
                .create_relationship(
                    &relationship.subject_normalized,
                    &relationship.predicate,
                    &relationship.object_normalized,
                    relationship.confidence,
                    &relationship.context,
                )
                .await
                .map_err(|err| graph_write_error("persist relationship", err))?;

            *relationships_by_predicate.entry(relationship.predicate.clone()).or_insert(0) += 1;

            relationship_results.push(RelationshipResult {
                subject: EntityRef {
                    text: relationship.subject_text.clone(),
                    normalized: relationship.subject_normalized.clone(),
                    type_full: relationship.subject_type.type_full.clone(),
                },
                predicate: relationship.predicate.clone(),
                object: EntityRef {
                    text: relationship.object_text.clone(),
                    normalized: relationship.object_normalized.clone(),
                    type_full: relationship.object_type.type_full.clone(),
                },
                confidence: relationship.confidence,
                context: relationship.context.clone(),
                spans_chunks: relationship_mapping.spans_chunks,
                chunk_rowids: relationship_mapping.chunk_rowids.iter().map(|r| *r as u64).collect(),
            });
        }

        let chunks_with_entities = chunk_node_ids
            .keys()
            .filter(|rowid| entity_mappings.values().any(|m| m.chunk_appearances.iter().any(|a| &a.vector_rowid == *rowid)))
            .count() as u64;

        let total_appearances: usize = entity_mappings.values().map(|m| m.chunk_appearances.len()).sum();
        let mean_entities_per_chunk = if chunks.is_empty() {
            0.0
        } else {
            total_appearances as f64 / chunks.len() as f64
        };

        let summary = IngestSummary {
            entities_by_type,
            relationships_by_predicate,
            chunks_with_entities,
            mean_entities_per_chunk,
        };

        Ok(IngestResponse {
            success: true,
            content_id,
            neo4j_document_id: document_node_id,
            entities_extracted: entity_results.len(),
            relationships_extracted: relationship_results.len(),
            processing_time_ms: started.elapsed().as_millis() as u64,
            entities: entity_results,
            relationships: relationship_results,
            summary,
        })
    }
}

/// Groups extracted entities by `normalized` so every occurrence of the
/// same entity (the NER path can emit several, one per mention) maps to a
/// single [`EntityResult`] carrying the union of chunk appearances.
fn group_entities(entities: Vec<ExtractedEntity>) -> Vec<(String, Vec<ExtractedEntity>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ExtractedEntity>> = HashMap::new();
    for entity in entities {
        if !groups.contains_key(&entity.normalized) {
            order.push(entity.normalized.clone());
        }
        groups.entry(entity.normalized.clone()).or_default().push(entity);
    }
    order.into_iter().map(|normalized| {
        let group = groups.remove(&normalized).unwrap_or_default();
        (normalized, group)
    }).collect()
}

fn mean_confidence(group: &[ExtractedEntity]) -> f32 {
    if group.is_empty() {
        return 0.0;
    }
    group.iter().map(|e| e.confidence).sum::<f32>() / group.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::HierarchicalType;
    use graph_store::FakeGraphStore;
    use llm_client::LlmClient;
    use std::time::Duration;

    fn base_chunks() -> Vec<ChunkInput> {
        vec![
            ChunkInput { vector_rowid: 1, chunk_index: 0, char_start: 0, char_end: 40, text: "Neo4j is a graph database used with Rust.".to_string() },
        ]
    }

    #[tokio::test]
    async fn process_document_persists_document_and_chunks_even_with_no_entities() {
        let graph: Arc<dyn GraphStore> = Arc::new(FakeGraphStore::new());
        let llm = Arc::new(LlmClient::new("http://127.0.0.1:1", Duration::from_millis(200), Duration::from_secs(30)));
        let extractor = Arc::new(UnifiedExtractor::new(llm, 4, kg_extractor::ExtractorConfig::default()));
        let orchestrator = PipelineOrchestrator::new(
            graph.clone(),
            Arc::new(NoopSchemaInitializer),
            extractor,
            None,
            false,
            0.4,
        );

        let chunks = base_chunks();
        let response = orchestrator
            .process_document(1, "https://example.com", "Doc", "Neo4j is a graph database used with Rust.", &chunks)
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.entities_extracted, 0);
        assert_eq!(response.relationships_extracted, 0);
        assert!(response.entities.is_empty());
    }

    #[tokio::test]
    async fn reingesting_the_same_document_is_idempotent_in_document_count() {
        let graph = Arc::new(FakeGraphStore::new());
        let graph_dyn: Arc<dyn GraphStore> = graph.clone();
        let llm = Arc::new(LlmClient::new("http://127.0.0.1:1", Duration::from_millis(200), Duration::from_secs(30)));
        let extractor = Arc::new(UnifiedExtractor::new(llm, 4, kg_extractor::ExtractorConfig::default()));
        let orchestrator = PipelineOrchestrator::new(
            graph_dyn,
            Arc::new(NoopSchemaInitializer),
            extractor,
            None,
            false,
            0.4,
        );

        let chunks = base_chunks();
        orchestrator.process_document(7, "https://example.com", "Doc", "Neo4j is a graph database used with Rust.", &chunks).await.unwrap();
        orchestrator.process_document(7, "https://example.com", "Doc", "Neo4j is a graph database used with Rust.", &chunks).await.unwrap();

        assert_eq!(graph.document_count(), 1);
    }

    #[test]
    fn graph_write_error_keeps_non_driver_failures_as_processing() {
        let err = graph_write_error("persist entity", GraphError::MissingRow);
        assert!(matches!(err, AppError::Processing(_)));

        let err = graph_write_error("persist relationship", GraphError::InvalidPredicate("bad predicate".to_string()));
        assert!(matches!(err, AppError::Processing(_)));
    }

    #[test]
    fn group_entities_merges_repeated_normalized_occurrences() {
        let entity_type = HierarchicalType::parse("Database::Graph");
        let entities = vec![
            ExtractedEntity { text: "Neo4j".into(), normalized: "neo4j".into(), entity_type: entity_type.clone(), confidence: 0.8, start: 0, end: 5, context_before: String::new(), context_after: String::new(), sentence: String::new() },
            ExtractedEntity { text: "Neo4j".into(), normalized: "neo4j".into(), entity_type, confidence: 0.6, start: 50, end: 55, context_before: String::new(), context_after: String::new(), sentence: String::new() },
        ];
        let groups = group_entities(entities);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].1.len(), 2);
    }
}
