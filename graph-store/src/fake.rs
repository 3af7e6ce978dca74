use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GraphError;
use crate::model::{
    ChunkSearchResult, CoOccurringEntity, DocumentStats, EnhancedSearchTraversal, EntityInput,
    EntitySearchResult, ExpansionChunkRow, ResolvedChunkRow,
};
use crate::store::{EntityLookup, GraphStore};

#[derive(Debug, Clone)]
struct FakeEntity {
    node_id: String,
    text: String,
    type_primary: String,
    type_sub1: Option<String>,
    type_sub2: Option<String>,
    type_sub3: Option<String>,
    type_full: String,
    mention_count: u64,
    avg_confidence: f32,
}

#[derive(Debug, Clone)]
struct FakeDocument {
    node_id: String,
    url: String,
    title: String,
    chunk_count: i64,
}

#[derive(Debug, Clone)]
struct FakeRelationship {
    confidence: f32,
    occurrence_count: u64,
}

#[derive(Debug, Clone)]
struct FakeChunk {
    node_id: String,
    document_id: String,
    vector_rowid: i64,
    chunk_index: u32,
    text_preview: String,
}

#[derive(Default)]
struct FakeState {
    documents: HashMap<i64, FakeDocument>,
    entities: HashMap<String, FakeEntity>,
    relationships: HashMap<(String, String, String), FakeRelationship>,
    co_occurrences: HashMap<(String, String), (u64, Vec<i64>)>,
    mentions: usize,
    next_node_id: u64,
    chunks: HashMap<String, FakeChunk>,
    entity_id_to_normalized: HashMap<String, String>,
    document_id_to_content_id: HashMap<String, i64>,
    /// entity normalized -> set of chunk node ids it is mentioned in.
    mentions_by_entity: HashMap<String, HashSet<String>>,
    /// chunk node id -> set of entity normalized mentioned in it.
    mentions_by_chunk: HashMap<String, HashSet<String>>,
}

impl FakeState {
    fn next_id(&mut self) -> String {
        self.next_node_id += 1;
        format!("fake:{}", self.next_node_id)
    }
}

/// An in-process [`GraphStore`] double backed by plain Rust maps, standing
/// in for a live Neo4j instance in pipeline-level unit tests (Neo4j, unlike
/// the upstream store, has no embeddable in-memory mode).
#[derive(Default)]
pub struct FakeGraphStore {
    state: Mutex<FakeState>,
}

impl FakeGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_mention_count(&self, normalized: &str) -> Option<u64> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entities
            .get(normalized)
            .map(|e| e.mention_count)
    }

    pub fn entity_count(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).entities.len()
    }

    pub fn document_count(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).documents.len()
    }

    pub fn relationship_occurrence_count(
        &self,
        subject_normalized: &str,
        predicate: &str,
        object_normalized: &str,
    ) -> Option<u64> {
        let key = (
            subject_normalized.to_string(),
            predicate.to_string(),
            object_normalized.to_string(),
        );
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .relationships
            .get(&key)
            .map(|r| r.occurrence_count)
    }
}

#[async_trait]
impl GraphStore for FakeGraphStore {
    async fn create_document(&self, content_id: i64, url: &str, title: &str) -> Result<String, GraphError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = state.documents.get(&content_id) {
            return Ok(existing.node_id.clone());
        }
        let node_id = state.next_id();
        state.document_id_to_content_id.insert(node_id.clone(), content_id);
        state.documents.insert(
            content_id,
            FakeDocument {
                node_id: node_id.clone(),
                url: url.to_string(),
                title: title.to_string(),
                chunk_count: 0,
            },
        );
        Ok(node_id)
    }

    async fn create_chunk(
        &self,
        document_id: &str,
        vector_rowid: i64,
        chunk_index: u32,
        _char_start: usize,
        _char_end: usize,
        text_preview: &str,
    ) -> Result<String, GraphError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(doc) = state.documents.values_mut().find(|d| d.node_id == document_id) {
            doc.chunk_count += 1;
        }
        let node_id = state.next_id();
        state.chunks.insert(
            node_id.clone(),
            FakeChunk {
                node_id: node_id.clone(),
                document_id: document_id.to_string(),
                vector_rowid,
                chunk_index,
                text_preview: text_preview.chars().take(200).collect(),
            },
        );
        Ok(node_id)
    }

    async fn create_entity(&self, input: EntityInput<'_>) -> Result<String, GraphError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = state.entities.get_mut(input.normalized) {
            existing.mention_count += 1;
            existing.avg_confidence = (existing.avg_confidence * (existing.mention_count - 1) as f32
                + input.confidence)
                / existing.mention_count as f32;
            return Ok(existing.node_id.clone());
        }

        let node_id = state.next_id();
        state
            .entity_id_to_normalized
            .insert(node_id.clone(), input.normalized.to_string());
        state.entities.insert(
            input.normalized.to_string(),
            FakeEntity {
                node_id: node_id.clone(),
                text: input.text.to_string(),
                type_primary: input.entity_type.type_primary.clone(),
                type_sub1: input.entity_type.type_sub1.clone(),
                type_sub2: input.entity_type.type_sub2.clone(),
                type_sub3: input.entity_type.type_sub3.clone(),
                type_full: input.entity_type.type_full.clone(),
                mention_count: 1,
                avg_confidence: input.confidence,
            },
        );
        Ok(node_id)
    }

    async fn link_entity_to_chunk(
        &self,
        entity_id: &str,
        chunk_id: &str,
        _offset_start: usize,
        _offset_end: usize,
        _confidence: f32,
        _context_before: &str,
        _context_after: &str,
        _sentence: &str,
    ) -> Result<(), GraphError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.mentions += 1;
        if let Some(normalized) = state.entity_id_to_normalized.get(entity_id).cloned() {
            state
                .mentions_by_entity
                .entry(normalized.clone())
                .or_default()
                .insert(chunk_id.to_string());
            state
                .mentions_by_chunk
                .entry(chunk_id.to_string())
                .or_default()
                .insert(normalized);
        }
        Ok(())
    }

    async fn create_relationship(
        &self,
        subject_normalized: &str,
        predicate: &str,
        object_normalized: &str,
        confidence: f32,
        _context: &str,
    ) -> Result<(), GraphError> {
        if predicate.is_empty() || !predicate.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GraphError::InvalidPredicate(predicate.to_string()));
        }

        let key = (
            subject_normalized.to_string(),
            predicate.to_string(),
            object_normalized.to_string(),
        );
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.relationships.get_mut(&key) {
            Some(existing) => {
                existing.confidence = (existing.confidence * existing.occurrence_count as f32 + confidence)
                    / (existing.occurrence_count + 1) as f32;
                existing.occurrence_count += 1;
            }
            None => {
                state.relationships.insert(
                    key,
                    FakeRelationship {
                        confidence,
                        occurrence_count: 1,
                    },
                );
            }
        }
        Ok(())
    }

    async fn update_co_occurrence(
        &self,
        entity1_normalized: &str,
        entity2_normalized: &str,
        chunk_rowid: i64,
    ) -> Result<(), GraphError> {
        let (first, second) = if entity1_normalized <= entity2_normalized {
            (entity1_normalized.to_string(), entity2_normalized.to_string())
        } else {
            (entity2_normalized.to_string(), entity1_normalized.to_string())
        };

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let entry = state.co_occurrences.entry((first, second)).or_insert((0, Vec::new()));
        entry.0 += 1;
        entry.1.push(chunk_rowid);
        Ok(())
    }

    async fn document_stats(&self, content_id: i64) -> Result<Option<DocumentStats>, GraphError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.documents.get(&content_id).map(|doc| DocumentStats {
            node_id: doc.node_id.clone(),
            url: doc.url.clone(),
            title: doc.title.clone(),
            chunk_count: doc.chunk_count,
            entity_count: state.entities.len() as i64,
        }))
    }

    async fn search_entities(
        &self,
        terms: &[String],
        limit: usize,
        min_mentions: u64,
    ) -> Result<Vec<EntitySearchResult>, GraphError> {
        let terms_lower: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut results: Vec<EntitySearchResult> = state
            .entities
            .iter()
            .filter(|(_, e)| e.mention_count >= min_mentions)
            .filter(|(normalized, e)| {
                let text_lower = e.text.to_lowercase();
                terms_lower
                    .iter()
                    .any(|t| text_lower.contains(t.as_str()) || normalized.contains(t.as_str()))
            })
            .map(|(normalized, e)| EntitySearchResult {
                text: e.text.clone(),
                normalized: normalized.clone(),
                type_full: e.type_full.clone(),
                mention_count: e.mention_count as i64,
                avg_confidence: e.avg_confidence,
            })
            .collect();
        results.sort_by(|a, b| b.mention_count.cmp(&a.mention_count));
        results.truncate(limit);
        Ok(results)
    }

    async fn search_chunks(&self, lookup: EntityLookup<'_>) -> Result<Vec<ChunkSearchResult>, GraphError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        let normalized_set: HashSet<String> = match lookup {
            EntityLookup::Ids(ids) => ids
                .iter()
                .filter_map(|id| state.entity_id_to_normalized.get(id).cloned())
                .collect(),
            EntityLookup::Names(names) => {
                let names_lower: HashSet<String> = names.iter().map(|n| n.to_lowercase()).collect();
                state
                    .entities
                    .iter()
                    .filter(|(normalized, e)| {
                        names_lower.contains(normalized.as_str())
                            || names_lower.contains(&e.text.to_lowercase())
                    })
                    .map(|(normalized, _)| normalized.clone())
                    .collect()
            }
        };

        let mut results: Vec<ChunkSearchResult> = state
            .chunks
            .values()
            .filter_map(|chunk| {
                let mentioned = state.mentions_by_chunk.get(&chunk.node_id)?;
                let matched: HashSet<&String> = mentioned.intersection(&normalized_set).collect();
                if matched.is_empty() {
                    return None;
                }
                let content_id = state.document_id_to_content_id.get(&chunk.document_id);
                let doc = content_id.and_then(|id| state.documents.get(id));
                Some(ChunkSearchResult {
                    vector_rowid: chunk.vector_rowid,
                    chunk_index: i64::from(chunk.chunk_index),
                    text_preview: chunk.text_preview.clone(),
                    matched_entity_count: matched.len() as i64,
                    document_url: doc.map(|d| d.url.clone()),
                    document_title: doc.map(|d| d.title.clone()),
                })
            })
            .collect();
        results.sort_by(|a, b| {
            b.matched_entity_count
                .cmp(&a.matched_entity_count)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        Ok(results)
    }

    async fn expand_entities(
        &self,
        entity_names: &[String],
        max_expansions: usize,
        expansion_depth: u8,
    ) -> Result<Vec<CoOccurringEntity>, GraphError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut visited: HashSet<String> = entity_names.iter().map(|n| n.to_lowercase()).collect();
        let mut frontier: Vec<String> = visited.iter().cloned().collect();
        let mut collected: Vec<CoOccurringEntity> = Vec::new();

        let depth = expansion_depth.clamp(1, 3);
        for _ in 0..depth {
            if frontier.is_empty() || collected.len() >= max_expansions {
                break;
            }
            let mut shared_counts: HashMap<String, usize> = HashMap::new();
            for seed in &frontier {
                let Some(chunks) = state.mentions_by_entity.get(seed) else {
                    continue;
                };
                for chunk_id in chunks {
                    let Some(entities_in_chunk) = state.mentions_by_chunk.get(chunk_id) else {
                        continue;
                    };
                    for other in entities_in_chunk {
                        if visited.contains(other) {
                            continue;
                        }
                        *shared_counts.entry(other.clone()).or_insert(0) += 1;
                    }
                }
            }

            let mut ranked: Vec<(String, usize)> = shared_counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1));

            let mut next_frontier = Vec::new();
            for (normalized, shared_chunk_count) in ranked {
                if collected.len() >= max_expansions {
                    break;
                }
                let Some(entity) = state.entities.get(&normalized) else {
                    continue;
                };
                let predicates: Vec<String> = state
                    .relationships
                    .keys()
                    .filter(|(subj, _, obj)| {
                        (frontier.contains(subj) && obj == &normalized)
                            || (frontier.contains(obj) && subj == &normalized)
                    })
                    .map(|(_, predicate, _)| predicate.to_lowercase())
                    .collect();

                visited.insert(normalized.clone());
                next_frontier.push(normalized.clone());
                collected.push(CoOccurringEntity {
                    text: entity.text.clone(),
                    normalized,
                    type_full: entity.type_full.clone(),
                    shared_chunk_count: shared_chunk_count as i64,
                    relationship_predicates: predicates,
                });
            }
            frontier = next_frontier;
        }

        collected.truncate(max_expansions);
        Ok(collected)
    }

    async fn enhanced_search_traversal(
        &self,
        search_term_entities: &[String],
    ) -> Result<EnhancedSearchTraversal, GraphError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let terms_lower: HashSet<String> = search_term_entities.iter().map(|t| t.to_lowercase()).collect();

        let resolved: HashSet<String> = state
            .entities
            .iter()
            .filter(|(_, e)| terms_lower.contains(&e.text.to_lowercase()))
            .map(|(normalized, _)| normalized.clone())
            .collect();

        let mut resolved_chunks = Vec::new();
        let mut co_occurring: HashSet<String> = HashSet::new();
        for chunk in state.chunks.values() {
            let Some(mentioned) = state.mentions_by_chunk.get(&chunk.node_id) else {
                continue;
            };
            let hit: Vec<String> = mentioned.intersection(&resolved).cloned().collect();
            if hit.is_empty() {
                continue;
            }
            for other in mentioned {
                if !resolved.contains(other) {
                    co_occurring.insert(other.clone());
                }
            }
            resolved_chunks.push(ResolvedChunkRow {
                vector_rowid: chunk.vector_rowid,
                chunk_index: i64::from(chunk.chunk_index),
                text_preview: chunk.text_preview.clone(),
                resolved_entities: hit,
            });
        }

        let mut expansion_chunks = Vec::new();
        for chunk in state.chunks.values() {
            let Some(mentioned) = state.mentions_by_chunk.get(&chunk.node_id) else {
                continue;
            };
            let hit: Vec<String> = mentioned.intersection(&co_occurring).cloned().collect();
            if hit.is_empty() {
                continue;
            }
            expansion_chunks.push(ExpansionChunkRow {
                vector_rowid: chunk.vector_rowid,
                chunk_index: i64::from(chunk.chunk_index),
                text_preview: chunk.text_preview.clone(),
                co_occurring_entities: hit,
            });
        }

        Ok(EnhancedSearchTraversal {
            resolved_entity_count: resolved.len(),
            resolved_chunks,
            expansion_chunks,
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::HierarchicalType;

    #[tokio::test]
    async fn create_entity_twice_doubles_mention_count_and_averages_confidence() {
        let store = FakeGraphStore::new();
        let entity_type = HierarchicalType::parse("Database::Graph");

        store
            .create_entity(EntityInput {
                text: "Neo4j",
                normalized: "neo4j",
                entity_type: &entity_type,
                confidence: 0.8,
            })
            .await
            .unwrap();
        store
            .create_entity(EntityInput {
                text: "Neo4j",
                normalized: "neo4j",
                entity_type: &entity_type,
                confidence: 0.6,
            })
            .await
            .unwrap();

        assert_eq!(store.entity_mention_count("neo4j"), Some(2));
    }

    #[tokio::test]
    async fn create_document_is_idempotent_by_content_id() {
        let store = FakeGraphStore::new();
        let first = store.create_document(1, "https://example.com", "Example").await.unwrap();
        let second = store.create_document(1, "https://example.com", "Example").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.document_count(), 1);
    }

    #[tokio::test]
    async fn create_relationship_rejects_unsafe_predicate() {
        let store = FakeGraphStore::new();
        let result = store
            .create_relationship("a", "uses; DROP", "b", 0.9, "context")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn create_relationship_twice_increments_occurrence_count() {
        let store = FakeGraphStore::new();
        store.create_relationship("a", "uses", "b", 0.9, "context").await.unwrap();
        store.create_relationship("a", "uses", "b", 0.7, "context").await.unwrap();
        assert_eq!(store.relationship_occurrence_count("a", "uses", "b"), Some(2));
    }
}
