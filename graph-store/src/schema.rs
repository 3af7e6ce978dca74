use neo4rs::{query, Graph};

use crate::error::GraphError;

const CONSTRAINTS: &[(&str, &str)] = &[
    (
        "unique_document_content_id",
        "CREATE CONSTRAINT unique_document_content_id IF NOT EXISTS FOR (d:Document) REQUIRE d.content_id IS UNIQUE",
    ),
    (
        "unique_chunk_rowid",
        "CREATE CONSTRAINT unique_chunk_rowid IF NOT EXISTS FOR (c:Chunk) REQUIRE c.vector_rowid IS UNIQUE",
    ),
    (
        "unique_entity_normalized",
        "CREATE CONSTRAINT unique_entity_normalized IF NOT EXISTS FOR (e:Entity) REQUIRE e.normalized IS UNIQUE",
    ),
];

const INDEXES: &[(&str, &str)] = &[
    ("index_document_url", "CREATE INDEX index_document_url IF NOT EXISTS FOR (d:Document) ON (d.url)"),
    ("index_entity_type_primary", "CREATE INDEX index_entity_type_primary IF NOT EXISTS FOR (e:Entity) ON (e.type_primary)"),
    ("index_entity_type_full", "CREATE INDEX index_entity_type_full IF NOT EXISTS FOR (e:Entity) ON (e.type_full)"),
    ("index_entity_text", "CREATE INDEX index_entity_text IF NOT EXISTS FOR (e:Entity) ON (e.text)"),
    ("index_chunk_index", "CREATE INDEX index_chunk_index IF NOT EXISTS FOR (c:Chunk) ON (c.chunk_index)"),
];

#[derive(Debug, Default)]
pub struct SchemaInitResult {
    pub constraints_created: usize,
    pub indexes_created: usize,
}

#[derive(Debug, Default)]
pub struct SchemaValidation {
    pub valid: bool,
    pub orphaned_chunks: i64,
    pub entities_without_mentions: i64,
}

/// Idempotent constraint/index creation and integrity checks over the same
/// graph connection a [`crate::GraphClient`] uses. Kept separate from the
/// `GraphStore` trait since schema operations are administrative, not
/// per-document writes, and `clear_all_data` must never be reachable from
/// an HTTP handler.
pub struct SchemaManager<'a> {
    graph: &'a Graph,
}

impl<'a> SchemaManager<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    pub async fn initialize_schema(&self) -> SchemaInitResult {
        let mut result = SchemaInitResult::default();

        for (name, cypher) in CONSTRAINTS {
            match self.graph.run(query(cypher)).await {
                Ok(()) => result.constraints_created += 1,
                Err(err) => tracing::warn!(constraint = name, error = %err, "failed to create constraint"),
            }
        }

        for (name, cypher) in INDEXES {
            match self.graph.run(query(cypher)).await {
                Ok(()) => result.indexes_created += 1,
                Err(err) => tracing::warn!(index = name, error = %err, "failed to create index"),
            }
        }

        tracing::info!(
            constraints = result.constraints_created,
            indexes = result.indexes_created,
            "graph schema initialized"
        );
        result
    }

    pub async fn validate_schema(&self) -> Result<SchemaValidation, GraphError> {
        let orphaned_chunks = self
            .scalar_count(
                "MATCH (c:Chunk) WHERE NOT EXISTS((c)<-[:HAS_CHUNK]-(:Document))
                 RETURN count(c) AS value",
            )
            .await?;

        let entities_without_mentions = self
            .scalar_count(
                "MATCH (e:Entity) WHERE NOT EXISTS((e)-[:MENTIONED_IN]->(:Chunk))
                 RETURN count(e) AS value",
            )
            .await?;

        Ok(SchemaValidation {
            valid: orphaned_chunks == 0,
            orphaned_chunks,
            entities_without_mentions,
        })
    }

    /// Deletes every node and relationship in the graph. Not reachable
    /// over HTTP; kept only for parity with administrative tooling.
    pub async fn clear_all_data(&self) -> Result<i64, GraphError> {
        let mut stream = self
            .graph
            .execute(query("MATCH (n) DETACH DELETE n RETURN count(n) AS deleted"))
            .await?;
        let deleted = stream
            .next()
            .await?
            .and_then(|row| row.get::<i64>("deleted").ok())
            .unwrap_or(0);
        tracing::warn!(deleted, "cleared all graph data");
        Ok(deleted)
    }

    async fn scalar_count(&self, cypher: &str) -> Result<i64, GraphError> {
        let mut stream = self.graph.execute(query(cypher)).await?;
        let row = stream.next().await?.ok_or(GraphError::MissingRow)?;
        row.get::<i64>("value").map_err(|_| GraphError::MissingRow)
    }
}
