use std::sync::Arc;
use std::time::Duration;

use api_router::ApiState;
use axum::Router;
use axum_test::TestServer;
use common::utils::config::AppConfig;
use graph_store::{FakeGraphStore, GraphStore};
use ingestion_pipeline::{NoopSchemaInitializer, PipelineOrchestrator};
use kg_extractor::{ExtractorConfig, UnifiedExtractor};
use llm_client::LlmClient;

/// Mirrors the defaults in `AppConfig`'s `get_config` path, minus
/// anything read from the environment — every integration test runs
/// against an unreachable Neo4j/LLM endpoint and a [`FakeGraphStore`]
/// test double instead.
pub fn test_config() -> AppConfig {
    AppConfig {
        neo4j_uri: "bolt://127.0.0.1:1".to_string(),
        neo4j_user: "neo4j".to_string(),
        neo4j_password: "password".to_string(),
        neo4j_database: "neo4j".to_string(),
        neo4j_max_connection_lifetime: 3600,
        neo4j_max_connection_pool_size: 50,
        neo4j_connection_timeout: 30,
        llm_base_url: "http://127.0.0.1:1".to_string(),
        llm_timeout: 1,
        llm_max_tokens: 512,
        llm_temperature: 0.6,
        llm_retry_interval: 30,
        ner_base_url: None,
        entity_min_confidence: 0.4,
        relation_min_confidence: 0.45,
        max_concurrent_extractions: 4,
        use_ner_entities: false,
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        ingest_max_body_bytes: 5 * 1024 * 1024,
    }
}

/// Builds a full router over a fresh [`FakeGraphStore`], an LLM client
/// pointed at an address nothing listens on (every extraction call
/// degrades to an empty KG per §4.3's failure semantics), and no NER
/// client. Returns the shared graph handle too, so tests can seed data
/// directly or assert on post-request state.
pub fn build_test_app() -> (Router, Arc<FakeGraphStore>) {
    let config = test_config();

    let fake_graph = Arc::new(FakeGraphStore::new());
    let graph: Arc<dyn GraphStore> = fake_graph.clone();

    let llm = Arc::new(LlmClient::new(
        config.llm_base_url.clone(),
        Duration::from_millis(200),
        Duration::from_secs(config.llm_retry_interval),
    ));

    let extractor = Arc::new(UnifiedExtractor::new(
        llm.clone(),
        config.max_concurrent_extractions,
        ExtractorConfig {
            min_entity_confidence: config.entity_min_confidence,
            min_relation_confidence: config.relation_min_confidence,
            max_tokens: config.llm_max_tokens,
            temperature: config.llm_temperature,
        },
    ));

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        graph.clone(),
        Arc::new(NoopSchemaInitializer),
        extractor,
        None,
        false,
        config.entity_min_confidence,
    ));

    let api_state = ApiState::new(config, graph, llm, None, orchestrator);
    let app = api_router::api_routes(&api_state);

    (app, fake_graph)
}

pub fn test_server() -> (TestServer, Arc<FakeGraphStore>) {
    let (app, graph) = build_test_app();
    (TestServer::new(app).expect("failed to build test server"), graph)
}

/// A minimal well-formed `IngestRequest` body, two chunks, scenario 1
/// from the spec's end-to-end list.
pub fn healthy_ingest_body(content_id: u64) -> serde_json::Value {
    serde_json::json!({
        "content_id": content_id,
        "url": "https://example.com/doc",
        "title": "A document about Neo4j and Python",
        "markdown": "Neo4j is a graph database. Python is a programming language often used with Neo4j for data science workloads and pipelines.",
        "chunks": [
            {
                "vector_rowid": 45001,
                "chunk_index": 0,
                "char_start": 0,
                "char_end": 60,
                "text": "Neo4j is a graph database used widely in data engineering."
            },
            {
                "vector_rowid": 45002,
                "chunk_index": 1,
                "char_start": 50,
                "char_end": 130,
                "text": "Python is a programming language often used with Neo4j for data science work."
            }
        ]
    })
}
