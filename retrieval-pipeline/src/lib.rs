//! Enhanced search (C9): one graph traversal, tiered scoring, dedup, and
//! truncation (§4.9). The traversal itself lives in [`graph_store`]
//! (C5); this crate owns only the scoring/dedup/truncation that turns a
//! raw [`EnhancedSearchTraversal`] into a ranked, capped chunk list.

use std::collections::HashSet;
use std::time::Instant;

use graph_store::{EnhancedSearchTraversal, GraphError, GraphStore};
use serde::{Deserialize, Serialize};

const MAX_MAX_CHUNKS: usize = 500;
const TEXT_PREVIEW_MAX: usize = 500;

/// One chunk in a `/api/v1/search/enhanced` response, after scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub vector_rowid: i64,
    pub chunk_index: i64,
    pub text_preview: String,
    pub score: f32,
    pub matched_entities: Vec<String>,
}

/// Statistics accompanying a `/api/v1/search/enhanced` response (§4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhancedSearchStats {
    pub query_execution_ms: u64,
    pub total_found: usize,
    pub returned: usize,
    pub multi_entity_chunk_count: usize,
    pub single_entity_chunk_count: usize,
    pub expansion_only_chunk_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnhancedSearchResult {
    pub chunks: Vec<ScoredChunk>,
    pub stats: EnhancedSearchStats,
}

/// Runs the single-traversal enhanced search (§4.9): resolves
/// `search_term_entities`, scores the resulting chunks by tier, dedupes by
/// `vector_rowid` (resolved chunks first, then expansion-only chunks), and
/// truncates to `max_chunks` (capped at [`MAX_MAX_CHUNKS`]).
pub async fn run_enhanced_search(
    graph: &dyn GraphStore,
    search_term_entities: &[String],
    max_chunks: usize,
) -> Result<EnhancedSearchResult, GraphError> {
    let max_chunks = max_chunks.min(MAX_MAX_CHUNKS);
    let started = Instant::now();
    let traversal = graph.enhanced_search_traversal(search_term_entities).await?;
    let query_execution_ms = started.elapsed().as_millis() as u64;

    let result = score_traversal(traversal, max_chunks, query_execution_ms);
    Ok(result)
}

/// The pure scoring/dedup/truncation step, separated from the traversal
/// call so it can be unit-tested without a graph connection.
pub fn score_traversal(
    traversal: EnhancedSearchTraversal,
    max_chunks: usize,
    query_execution_ms: u64,
) -> EnhancedSearchResult {
    let max_chunks = max_chunks.min(MAX_MAX_CHUNKS);
    let mut seen: HashSet<i64> = HashSet::new();
    let mut scored: Vec<ScoredChunk> = Vec::new();

    let mut multi_entity_chunk_count = 0usize;
    let mut single_entity_chunk_count = 0usize;
    let mut expansion_only_chunk_count = 0usize;

    for row in &traversal.resolved_chunks {
        if !seen.insert(row.vector_rowid) {
            continue;
        }
        let score = if row.resolved_entities.len() >= 2 {
            multi_entity_chunk_count += 1;
            1.0
        } else {
            single_entity_chunk_count += 1;
            0.6
        };
        scored.push(ScoredChunk {
            vector_rowid: row.vector_rowid,
            chunk_index: row.chunk_index,
            text_preview: truncate_preview(&row.text_preview),
            score,
            matched_entities: row.resolved_entities.clone(),
        });
    }

    for row in &traversal.expansion_chunks {
        if !seen.insert(row.vector_rowid) {
            continue;
        }
        let co_occurring_count = row.co_occurring_entities.len();
        let score = if co_occurring_count > 3 {
            0.8
        } else if co_occurring_count >= 2 {
            0.6
        } else {
            0.4
        };
        expansion_only_chunk_count += 1;
        scored.push(ScoredChunk {
            vector_rowid: row.vector_rowid,
            chunk_index: row.chunk_index,
            text_preview: truncate_preview(&row.text_preview),
            score,
            matched_entities: row.co_occurring_entities.clone(),
        });
    }

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let total_found = scored.len();
    scored.truncate(max_chunks);

    EnhancedSearchResult {
        chunks: scored,
        stats: EnhancedSearchStats {
            query_execution_ms,
            total_found,
            returned: total_found.min(max_chunks),
            multi_entity_chunk_count,
            single_entity_chunk_count,
            expansion_only_chunk_count,
        },
    }
}

fn truncate_preview(text: &str) -> String {
    text.chars().take(TEXT_PREVIEW_MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_store::{ExpansionChunkRow, ResolvedChunkRow};

    fn traversal_with_neo4j_and_python() -> EnhancedSearchTraversal {
        EnhancedSearchTraversal {
            resolved_entity_count: 2,
            resolved_chunks: vec![
                ResolvedChunkRow {
                    vector_rowid: 1,
                    chunk_index: 0,
                    text_preview: "Neo4j and Python together.".to_string(),
                    resolved_entities: vec!["neo4j".to_string(), "python".to_string()],
                },
                ResolvedChunkRow {
                    vector_rowid: 2,
                    chunk_index: 1,
                    text_preview: "Python only here.".to_string(),
                    resolved_entities: vec!["python".to_string()],
                },
            ],
            expansion_chunks: vec![],
        }
    }

    #[test]
    fn dual_entity_chunk_scores_above_single_entity_chunk() {
        let result = score_traversal(traversal_with_neo4j_and_python(), 500, 12);
        assert_eq!(result.chunks.len(), 2);
        assert_eq!(result.chunks[0].vector_rowid, 1);
        assert_eq!(result.chunks[0].score, 1.0);
        assert_eq!(result.chunks[1].vector_rowid, 2);
        assert_eq!(result.chunks[1].score, 0.6);
    }

    #[test]
    fn expansion_chunk_tiers_follow_co_occurring_entity_count() {
        let traversal = EnhancedSearchTraversal {
            resolved_entity_count: 1,
            resolved_chunks: vec![],
            expansion_chunks: vec![
                ExpansionChunkRow {
                    vector_rowid: 10,
                    chunk_index: 0,
                    text_preview: "many neighbors".to_string(),
                    co_occurring_entities: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                },
                ExpansionChunkRow {
                    vector_rowid: 11,
                    chunk_index: 1,
                    text_preview: "a couple neighbors".to_string(),
                    co_occurring_entities: vec!["a".into(), "b".into()],
                },
                ExpansionChunkRow {
                    vector_rowid: 12,
                    chunk_index: 2,
                    text_preview: "one neighbor".to_string(),
                    co_occurring_entities: vec!["a".into()],
                },
            ],
        };
        let result = score_traversal(traversal, 500, 5);
        let score_of = |rowid: i64| result.chunks.iter().find(|c| c.vector_rowid == rowid).unwrap().score;
        assert_eq!(score_of(10), 0.8);
        assert_eq!(score_of(11), 0.6);
        assert_eq!(score_of(12), 0.4);
    }

    #[test]
    fn resolved_chunks_are_deduped_against_expansion_chunks_by_vector_rowid() {
        let traversal = EnhancedSearchTraversal {
            resolved_entity_count: 1,
            resolved_chunks: vec![ResolvedChunkRow {
                vector_rowid: 1,
                chunk_index: 0,
                text_preview: "resolved".to_string(),
                resolved_entities: vec!["neo4j".to_string()],
            }],
            expansion_chunks: vec![ExpansionChunkRow {
                vector_rowid: 1,
                chunk_index: 0,
                text_preview: "expansion-view of the same chunk".to_string(),
                co_occurring_entities: vec!["python".to_string()],
            }],
        };
        let result = score_traversal(traversal, 500, 1);
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].score, 0.6);
    }

    #[test]
    fn truncates_to_max_chunks_after_sorting() {
        let result = score_traversal(traversal_with_neo4j_and_python(), 1, 1);
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.stats.total_found, 2);
        assert_eq!(result.stats.returned, 1);
        assert_eq!(result.chunks[0].vector_rowid, 1);
    }
}
