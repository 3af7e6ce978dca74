use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph};

use crate::error::GraphError;
use crate::model::{
    ChunkSearchResult, CoOccurringEntity, DocumentStats, EnhancedSearchTraversal, EntityInput,
    EntitySearchResult, ExpansionChunkRow, ResolvedChunkRow,
};
use crate::store::{EntityLookup, GraphStore};

/// Wraps a pooled [`neo4rs::Graph`] connection and implements [`GraphStore`]
/// against Neo4j. One method per graph operation, each issuing the
/// `MERGE ... ON CREATE SET ... ON MATCH SET ...` Cypher shape so writes
/// are idempotent by construction.
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    pub async fn connect(
        uri: &str,
        user: &str,
        password: &str,
        database: &str,
        max_connection_pool_size: usize,
        max_connection_lifetime_secs: u64,
        connection_timeout_secs: u64,
    ) -> Result<Self, GraphError> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .db(database)
            .max_connections(max_connection_pool_size)
            .fetch_size(500)
            .connection_timeout(Duration::from_secs(connection_timeout_secs))
            .max_connection_lifetime(Duration::from_secs(max_connection_lifetime_secs))
            .build()?;

        let graph = Graph::connect(config).await?;
        tracing::info!(%uri, %database, "connected to graph database");
        Ok(Self { graph })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    async fn single_string_field(&self, q: neo4rs::Query, field: &str) -> Result<String, GraphError> {
        let mut stream = self.graph.execute(q).await?;
        let row = stream.next().await?.ok_or(GraphError::MissingRow)?;
        row.get::<String>(field).map_err(|_| GraphError::MissingRow)
    }
}

/// Validates that a predicate is safe to interpolate directly as a Cypher
/// relationship type (Neo4j has no parameter binding for labels/types).
fn validate_predicate(predicate: &str) -> Result<String, GraphError> {
    if predicate.is_empty()
        || !predicate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(GraphError::InvalidPredicate(predicate.to_string()));
    }
    Ok(predicate.to_ascii_uppercase())
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn create_document(
        &self,
        content_id: i64,
        url: &str,
        title: &str,
    ) -> Result<String, GraphError> {
        let q = query(
            "MERGE (d:Document {content_id: $content_id})
             SET d.url = $url,
                 d.title = $title,
                 d.created_at = COALESCE(d.created_at, datetime()),
                 d.updated_at = datetime()
             RETURN elementId(d) AS node_id",
        )
        .param("content_id", content_id)
        .param("url", url)
        .param("title", title);

        self.single_string_field(q, "node_id").await
    }

    async fn create_chunk(
        &self,
        document_id: &str,
        vector_rowid: i64,
        chunk_index: u32,
        char_start: usize,
        char_end: usize,
        text_preview: &str,
    ) -> Result<String, GraphError> {
        let preview: String = text_preview.chars().take(200).collect();
        let q = query(
            "MATCH (d:Document) WHERE elementId(d) = $doc_id
             MERGE (c:Chunk {vector_rowid: $vector_rowid})
             SET c.chunk_index = $chunk_index,
                 c.char_start = $char_start,
                 c.char_end = $char_end,
                 c.text_preview = $text_preview,
                 c.created_at = COALESCE(c.created_at, datetime())
             MERGE (d)-[:HAS_CHUNK]->(c)
             RETURN elementId(c) AS node_id",
        )
        .param("doc_id", document_id)
        .param("vector_rowid", vector_rowid)
        .param("chunk_index", i64::from(chunk_index))
        .param("char_start", char_start as i64)
        .param("char_end", char_end as i64)
        .param("text_preview", preview);

        self.single_string_field(q, "node_id").await
    }

    async fn create_entity(&self, input: EntityInput<'_>) -> Result<String, GraphError> {
        let entity_type = input.entity_type;
        let q = query(
            "MERGE (e:Entity {normalized: $normalized})
             ON CREATE SET
                 e.text = $text,
                 e.type_primary = $type_primary,
                 e.type_sub1 = $type_sub1,
                 e.type_sub2 = $type_sub2,
                 e.type_sub3 = $type_sub3,
                 e.type_full = $type_full,
                 e.created_at = datetime(),
                 e.mention_count = 1,
                 e.avg_confidence = $confidence
             ON MATCH SET
                 e.mention_count = e.mention_count + 1,
                 e.avg_confidence = (e.avg_confidence * (e.mention_count - 1) + $confidence) / e.mention_count,
                 e.updated_at = datetime()
             RETURN elementId(e) AS node_id",
        )
        .param("text", input.text)
        .param("normalized", input.normalized)
        .param("type_primary", entity_type.type_primary.as_str())
        .param("type_sub1", entity_type.type_sub1.clone())
        .param("type_sub2", entity_type.type_sub2.clone())
        .param("type_sub3", entity_type.type_sub3.clone())
        .param("type_full", entity_type.type_full.as_str())
        .param("confidence", f64::from(input.confidence));

        self.single_string_field(q, "node_id").await
    }

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
    ) -> Result<(), GraphError> {
        let context_before: String = context_before.chars().take(100).collect();
        let context_after: String = context_after.chars().take(100).collect();
        let sentence: String = sentence.chars().take(500).collect();

        let q = query(
            "MATCH (e:Entity) WHERE elementId(e) = $entity_id
             MATCH (c:Chunk) WHERE elementId(c) = $chunk_id
             MERGE (e)-[m:MENTIONED_IN]->(c)
             SET m.offset_start = $offset_start,
                 m.offset_end = $offset_end,
                 m.confidence = $confidence,
                 m.context_before = $context_before,
                 m.context_after = $context_after,
                 m.sentence = $sentence,
                 m.created_at = COALESCE(m.created_at, datetime())",
        )
        .param("entity_id", entity_id)
        .param("chunk_id", chunk_id)
        .param("offset_start", offset_start as i64)
        .param("offset_end", offset_end as i64)
        .param("confidence", f64::from(confidence))
        .param("context_before", context_before)
        .param("context_after", context_after)
        .param("sentence", sentence);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn create_relationship(
        &self,
        subject_normalized: &str,
        predicate: &str,
        object_normalized: &str,
        confidence: f32,
        context: &str,
    ) -> Result<(), GraphError> {
        let rel_type = validate_predicate(predicate)?;
        let context: String = context.chars().take(500).collect();

        let cypher = format!(
            "MATCH (s:Entity {{normalized: $subject}})
             MATCH (o:Entity {{normalized: $object}})
             MERGE (s)-[r:{rel_type}]->(o)
             ON CREATE SET
                 r.confidence = $confidence,
                 r.context = $context,
                 r.created_at = datetime(),
                 r.occurrence_count = 1
             ON MATCH SET
                 r.confidence = (r.confidence * r.occurrence_count + $confidence) / (r.occurrence_count + 1),
                 r.occurrence_count = r.occurrence_count + 1,
                 r.updated_at = datetime()"
        );

        let q = query(&cypher)
            .param("subject", subject_normalized)
            .param("object", object_normalized)
            .param("confidence", f64::from(confidence))
            .param("context", context);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn update_co_occurrence(
        &self,
        entity1_normalized: &str,
        entity2_normalized: &str,
        chunk_rowid: i64,
    ) -> Result<(), GraphError> {
        let (first, second) = if entity1_normalized <= entity2_normalized {
            (entity1_normalized, entity2_normalized)
        } else {
            (entity2_normalized, entity1_normalized)
        };

        let q = query(
            "MATCH (e1:Entity {normalized: $entity1})
             MATCH (e2:Entity {normalized: $entity2})
             MERGE (e1)-[co:CO_OCCURS_WITH]->(e2)
             ON CREATE SET
                 co.count = 1,
                 co.chunk_rowids = [$chunk_rowid],
                 co.created_at = datetime()
             ON MATCH SET
                 co.count = co.count + 1,
                 co.chunk_rowids = co.chunk_rowids + $chunk_rowid,
                 co.updated_at = datetime()",
        )
        .param("entity1", first)
        .param("entity2", second)
        .param("chunk_rowid", chunk_rowid);

        self.graph.run(q).await?;
        Ok(())
    }

    async fn document_stats(&self, content_id: i64) -> Result<Option<DocumentStats>, GraphError> {
        let q = query(
            "MATCH (d:Document {content_id: $content_id})
             OPTIONAL MATCH (d)-[:HAS_CHUNK]->(c:Chunk)
             OPTIONAL MATCH (e:Entity)-[:MENTIONED_IN]->(c)
             RETURN elementId(d) AS node_id, d.url AS url, d.title AS title,
                    COUNT(DISTINCT c) AS chunk_count, COUNT(DISTINCT e) AS entity_count",
        )
        .param("content_id", content_id);

        let mut stream = self.graph.execute(q).await?;
        let Some(row) = stream.next().await? else {
            return Ok(None);
        };

        Ok(Some(DocumentStats {
            node_id: row.get("node_id").map_err(|_| GraphError::MissingRow)?,
            url: row.get("url").unwrap_or_default(),
            title: row.get("title").unwrap_or_default(),
            chunk_count: row.get("chunk_count").unwrap_or(0),
            entity_count: row.get("entity_count").unwrap_or(0),
        }))
    }

    async fn search_entities(
        &self,
        terms: &[String],
        limit: usize,
        min_mentions: u64,
    ) -> Result<Vec<EntitySearchResult>, GraphError> {
        let terms_lower: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let q = query(
            "UNWIND $terms AS term
             MATCH (e:Entity)
             WHERE e.mention_count >= $min_mentions
               AND (toLower(e.text) CONTAINS term OR e.normalized CONTAINS term)
             WITH DISTINCT e
             RETURN e.text AS text, e.normalized AS normalized, e.type_full AS type_full,
                    e.mention_count AS mention_count, e.avg_confidence AS avg_confidence
             ORDER BY mention_count DESC
             LIMIT $limit",
        )
        .param("terms", terms_lower)
        .param("min_mentions", min_mentions as i64)
        .param("limit", limit as i64);

        let mut stream = self.graph.execute(q).await?;
        let mut results = Vec::new();
        while let Some(row) = stream.next().await? {
            results.push(EntitySearchResult {
                text: row.get("text").map_err(|_| GraphError::MissingRow)?,
                normalized: row.get("normalized").map_err(|_| GraphError::MissingRow)?,
                type_full: row.get("type_full").unwrap_or_default(),
                mention_count: row.get("mention_count").unwrap_or(0),
                avg_confidence: row.get::<f64>("avg_confidence").unwrap_or(0.0) as f32,
            });
        }
        Ok(results)
    }

    async fn search_chunks(&self, lookup: EntityLookup<'_>) -> Result<Vec<ChunkSearchResult>, GraphError> {
        let q = match lookup {
            EntityLookup::Ids(ids) => query(
                "MATCH (e:Entity) WHERE elementId(e) IN $ids
                 MATCH (e)-[:MENTIONED_IN]->(c:Chunk)
                 OPTIONAL MATCH (d:Document)-[:HAS_CHUNK]->(c)
                 WITH c, d, count(DISTINCT e) AS matched_entity_count
                 RETURN c.vector_rowid AS vector_rowid, c.chunk_index AS chunk_index,
                        c.text_preview AS text_preview, matched_entity_count,
                        d.url AS document_url, d.title AS document_title
                 ORDER BY matched_entity_count DESC, c.chunk_index ASC",
            )
            .param("ids", ids.to_vec()),
            EntityLookup::Names(names) => {
                let names_lower: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
                query(
                    "MATCH (e:Entity) WHERE toLower(e.text) IN $names OR e.normalized IN $names
                     MATCH (e)-[:MENTIONED_IN]->(c:Chunk)
                     OPTIONAL MATCH (d:Document)-[:HAS_CHUNK]->(c)
                     WITH c, d, count(DISTINCT e) AS matched_entity_count
                     RETURN c.vector_rowid AS vector_rowid, c.chunk_index AS chunk_index,
                            c.text_preview AS text_preview, matched_entity_count,
                            d.url AS document_url, d.title AS document_title
                     ORDER BY matched_entity_count DESC, c.chunk_index ASC",
                )
                .param("names", names_lower)
            }
        };

        let mut stream = self.graph.execute(q).await?;
        let mut results = Vec::new();
        while let Some(row) = stream.next().await? {
            results.push(ChunkSearchResult {
                vector_rowid: row.get("vector_rowid").map_err(|_| GraphError::MissingRow)?,
                chunk_index: row.get("chunk_index").unwrap_or(0),
                text_preview: row.get("text_preview").unwrap_or_default(),
                matched_entity_count: row.get("matched_entity_count").unwrap_or(0),
                document_url: row.get("document_url").ok(),
                document_title: row.get("document_title").ok(),
            });
        }
        Ok(results)
    }

    async fn expand_entities(
        &self,
        entity_names: &[String],
        max_expansions: usize,
        expansion_depth: u8,
    ) -> Result<Vec<CoOccurringEntity>, GraphError> {
        let mut visited: std::collections::HashSet<String> =
            entity_names.iter().map(|n| n.to_lowercase()).collect();
        let mut frontier: Vec<String> = entity_names.iter().map(|n| n.to_lowercase()).collect();
        let mut collected: Vec<CoOccurringEntity> = Vec::new();

        let depth = expansion_depth.clamp(1, 3);
        for _ in 0..depth {
            if frontier.is_empty() || collected.len() >= max_expansions {
                break;
            }

            let q = query(
                "MATCH (seed:Entity) WHERE toLower(seed.text) IN $frontier OR seed.normalized IN $frontier
                 MATCH (seed)-[:MENTIONED_IN]->(c:Chunk)<-[:MENTIONED_IN]-(other:Entity)
                 WHERE NOT (toLower(other.text) IN $visited OR other.normalized IN $visited)
                 WITH other, count(DISTINCT c) AS shared_chunk_count
                 OPTIONAL MATCH (seed2:Entity)-[r]-(other)
                 WHERE (toLower(seed2.text) IN $frontier OR seed2.normalized IN $frontier)
                   AND type(r) <> 'MENTIONED_IN' AND type(r) <> 'HAS_CHUNK' AND type(r) <> 'CO_OCCURS_WITH'
                 WITH other, shared_chunk_count, collect(DISTINCT type(r)) AS predicates
                 RETURN other.text AS text, other.normalized AS normalized, other.type_full AS type_full,
                        shared_chunk_count, predicates
                 ORDER BY shared_chunk_count DESC
                 LIMIT $limit",
            )
            .param("frontier", frontier.clone())
            .param("visited", visited.iter().cloned().collect::<Vec<_>>())
            .param("limit", max_expansions as i64);

            let mut stream = self.graph.execute(q).await?;
            let mut next_frontier = Vec::new();
            while let Some(row) = stream.next().await? {
                let normalized: String = row.get("normalized").map_err(|_| GraphError::MissingRow)?;
                if !visited.insert(normalized.to_lowercase()) {
                    continue;
                }
                next_frontier.push(normalized.clone());
                collected.push(CoOccurringEntity {
                    text: row.get("text").unwrap_or_default(),
                    normalized,
                    type_full: row.get("type_full").unwrap_or_default(),
                    shared_chunk_count: row.get("shared_chunk_count").unwrap_or(0),
                    relationship_predicates: row
                        .get::<Vec<String>>("predicates")
                        .unwrap_or_default()
                        .into_iter()
                        .map(|p| p.to_lowercase())
                        .collect(),
                });
                if collected.len() >= max_expansions {
                    break;
                }
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
        let terms_lower: Vec<String> = search_term_entities.iter().map(|t| t.to_lowercase()).collect();

        let resolved_count_q = query(
            "MATCH (e:Entity) WHERE toLower(e.text) IN $terms
             RETURN count(DISTINCT e) AS resolved_count",
        )
        .param("terms", terms_lower.clone());
        let resolved_entity_count = {
            let mut stream = self.graph.execute(resolved_count_q).await?;
            stream
                .next()
                .await?
                .and_then(|row| row.get::<i64>("resolved_count").ok())
                .unwrap_or(0) as usize
        };

        let resolved_q = query(
            "MATCH (e:Entity) WHERE toLower(e.text) IN $terms
             WITH collect(DISTINCT e) AS resolved
             UNWIND resolved AS re
             MATCH (re)-[:MENTIONED_IN]->(c:Chunk)
             WITH c, collect(DISTINCT re.normalized) AS resolved_entities
             RETURN c.vector_rowid AS vector_rowid, c.chunk_index AS chunk_index,
                    c.text_preview AS text_preview, resolved_entities",
        )
        .param("terms", terms_lower.clone());

        let mut resolved_chunks = Vec::new();
        let mut stream = self.graph.execute(resolved_q).await?;
        while let Some(row) = stream.next().await? {
            resolved_chunks.push(ResolvedChunkRow {
                vector_rowid: row.get("vector_rowid").map_err(|_| GraphError::MissingRow)?,
                chunk_index: row.get("chunk_index").unwrap_or(0),
                text_preview: row.get("text_preview").unwrap_or_default(),
                resolved_entities: row.get("resolved_entities").unwrap_or_default(),
            });
        }

        let expansion_q = query(
            "MATCH (re:Entity) WHERE toLower(re.text) IN $terms
             WITH collect(DISTINCT re) AS resolved
             UNWIND resolved AS r
             MATCH (r)-[:MENTIONED_IN]->(shared:Chunk)<-[:MENTIONED_IN]-(co:Entity)
             WHERE NOT co IN resolved
             WITH DISTINCT co
             MATCH (co)-[:MENTIONED_IN]->(ec:Chunk)
             WITH ec, collect(DISTINCT co.normalized) AS co_occurring_entities
             RETURN ec.vector_rowid AS vector_rowid, ec.chunk_index AS chunk_index,
                    ec.text_preview AS text_preview, co_occurring_entities",
        )
        .param("terms", terms_lower);

        let mut expansion_chunks = Vec::new();
        let mut stream = self.graph.execute(expansion_q).await?;
        while let Some(row) = stream.next().await? {
            expansion_chunks.push(ExpansionChunkRow {
                vector_rowid: row.get("vector_rowid").map_err(|_| GraphError::MissingRow)?,
                chunk_index: row.get("chunk_index").unwrap_or(0),
                text_preview: row.get("text_preview").unwrap_or_default(),
                co_occurring_entities: row.get("co_occurring_entities").unwrap_or_default(),
            });
        }

        Ok(EnhancedSearchTraversal {
            resolved_entity_count,
            resolved_chunks,
            expansion_chunks,
        })
    }

    async fn health_check(&self) -> bool {
        self.graph
            .execute(query("RETURN 1 AS health"))
            .await
            .is_ok()
    }
}
